use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::config::CheckerSettings;

/// What the archive is asked about for one diary record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTarget {
    pub folder: String,
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckVerdict {
    Found,
    NotFound,
}

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("failed to run checker '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("checker did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("checker was terminated by a signal")]
    Terminated,
}

/// Asks the archival system whether a record still exists.
#[async_trait]
pub trait ExistenceChecker: Send + Sync {
    async fn check(&self, target: &CheckTarget) -> Result<CheckVerdict, CheckerError>;
}

/// Runs `program [args...] <folder> <field> <value>` and reads only the exit
/// status: zero means found, any other code means not found.
#[derive(Debug, Clone)]
pub struct ProcessChecker {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessChecker {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn from_settings(settings: &CheckerSettings) -> Self {
        Self {
            program: settings.program.clone(),
            args: settings.args.clone(),
            timeout: settings.timeout(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl ExistenceChecker for ProcessChecker {
    async fn check(&self, target: &CheckTarget) -> Result<CheckVerdict, CheckerError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(&target.folder)
            .arg(&target.field)
            .arg(&target.value)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let status = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.status())
                .await
                .map_err(|_| CheckerError::TimedOut(limit))?,
            None => command.status().await,
        }
        .map_err(|source| CheckerError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if status.success() {
            Ok(CheckVerdict::Found)
        } else if status.code().is_some() {
            Ok(CheckVerdict::NotFound)
        } else {
            Err(CheckerError::Terminated)
        }
    }
}
