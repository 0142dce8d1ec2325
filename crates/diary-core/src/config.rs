use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DiaryError, Result};

pub const DEFAULT_CHECKER_PROGRAM: &str = "check_record_exists";

/// Runtime settings. Values come from an optional TOML file and are then
/// overridden by environment variables.
///
/// ```toml
/// database_url = "postgres://diary@localhost/diary"
/// max_connections = 5
///
/// [checker]
/// program = "/opt/archive/bin/check_record_exists"
/// args = ["--env", "prod"]
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub checker: CheckerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CheckerSettings {
    pub program: String,
    /// Arguments placed before `<folder> <field> <value>`.
    pub args: Vec<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            checker: CheckerSettings::default(),
        }
    }
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_CHECKER_PROGRAM.to_string(),
            args: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl CheckerSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Settings {
    /// Reads the optional config file, then applies the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|err| {
                    DiaryError::Config(format!("cannot read {}: {err}", path.display()))
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| DiaryError::Config(err.to_string()))
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").or_else(|| lookup("DIARY_DATABASE_URL")) {
            self.database_url = Some(url);
        }
        if let Some(raw) = lookup("DIARY_MAX_CONNECTIONS") {
            self.max_connections = parse_number("DIARY_MAX_CONNECTIONS", &raw)?;
        }
        if let Some(program) = lookup("DIARY_CHECKER_PROGRAM") {
            self.checker.program = program;
        }
        if let Some(raw) = lookup("DIARY_CHECKER_TIMEOUT_SECS") {
            self.checker.timeout_secs = Some(parse_number("DIARY_CHECKER_TIMEOUT_SECS", &raw)?);
        }
        Ok(())
    }

    pub fn database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            DiaryError::Config("DATABASE_URL (or DIARY_DATABASE_URL) must be set".to_string())
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| DiaryError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}
