#![allow(dead_code)]

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use diary_core::checker::{CheckTarget, CheckVerdict, CheckerError, ExistenceChecker};
use diary_core::db::DbPool;
use diary_core::{db, mappings::MappingRegistry, store::DiaryStore};
use tokio::sync::{Mutex, MutexGuard};

// Tests in one binary share the database; run them one at a time.
static DB_LOCK: Mutex<()> = Mutex::const_new(());

pub struct TestDb {
    pub database_url: String,
    pub pool: DbPool,
    pub store: DiaryStore,
    pub registry: MappingRegistry,
    _guard: MutexGuard<'static, ()>,
}

/// Connects to `DIARY_TEST_DATABASE_URL`, migrates and empties every table.
/// Returns `None` when the variable is not set.
pub async fn test_db(test_name: &str) -> Result<Option<TestDb>> {
    let database_url = match env::var("DIARY_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping {test_name} because DIARY_TEST_DATABASE_URL is not set");
            return Ok(None);
        }
    };

    let guard = DB_LOCK.lock().await;
    let pool = db::connect(&database_url, 4).await?;
    db::run_migrations(&pool).await?;

    sqlx::query(
        "TRUNCATE TABLE disposal_diary_records, disposal_diary_info, column_lookup, folder_lookup RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await?;
    restore_pending_index(&pool).await?;

    Ok(Some(TestDb {
        database_url,
        pool: pool.clone(),
        store: DiaryStore::new(pool.clone()),
        registry: MappingRegistry::new(pool),
        _guard: guard,
    }))
}

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../diary-parser/tests/data")
        .join(name)
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("read fixture")
}

/// Recreates the single-pending index if a test dropped it.
pub async fn restore_pending_index(pool: &DbPool) -> Result<()> {
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS uq_single_pending_diary ON disposal_diary_info ((status)) WHERE status = 0",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Answers from a fixed set of archived values and records every call.
pub struct ArchiveStub {
    present: HashSet<String>,
    fail: bool,
    calls: std::sync::Mutex<Vec<CheckTarget>>,
}

impl ArchiveStub {
    pub fn with_values(values: &[&str]) -> Self {
        Self {
            present: values.iter().map(|v| v.to_string()).collect(),
            fail: false,
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_values(&[])
        }
    }

    pub fn calls(&self) -> Vec<CheckTarget> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExistenceChecker for ArchiveStub {
    async fn check(&self, target: &CheckTarget) -> Result<CheckVerdict, CheckerError> {
        self.calls.lock().unwrap().push(target.clone());
        if self.fail {
            return Err(CheckerError::Terminated);
        }
        if self.present.contains(&target.value) {
            Ok(CheckVerdict::Found)
        } else {
            Ok(CheckVerdict::NotFound)
        }
    }
}
