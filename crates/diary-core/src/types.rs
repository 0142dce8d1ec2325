use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DiaryError;

/// Lifecycle of a loaded diary, stored as a SMALLINT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiaryStatus {
    Pending,
    ProcessedOk,
    ProcessedWithErrors,
}

impl DiaryStatus {
    pub fn code(&self) -> i16 {
        match self {
            DiaryStatus::Pending => 0,
            DiaryStatus::ProcessedOk => 1,
            DiaryStatus::ProcessedWithErrors => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(DiaryStatus::Pending),
            1 => Some(DiaryStatus::ProcessedOk),
            2 => Some(DiaryStatus::ProcessedWithErrors),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiaryStatus::Pending => "PENDING",
            DiaryStatus::ProcessedOk => "PROCESSED_OK",
            DiaryStatus::ProcessedWithErrors => "PROCESSED_WITH_ERRORS",
        }
    }
}

impl fmt::Display for DiaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state an operator closes a pending diary with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiaryOutcome {
    Ok,
    WithErrors,
}

impl DiaryOutcome {
    pub fn status(&self) -> DiaryStatus {
        match self {
            DiaryOutcome::Ok => DiaryStatus::ProcessedOk,
            DiaryOutcome::WithErrors => DiaryStatus::ProcessedWithErrors,
        }
    }
}

impl FromStr for DiaryOutcome {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ok" | "processed_ok" => Ok(DiaryOutcome::Ok),
            "errors" | "with_errors" | "processed_with_errors" => Ok(DiaryOutcome::WithErrors),
            other => Err(format!("unknown diary outcome '{other}' (expected 'ok' or 'errors')")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiaryInfo {
    pub id: i64,
    pub name: String,
    pub load_date: DateTime<Utc>,
    pub record_count: i32,
    pub notes: Option<String>,
    pub status: DiaryStatus,
}

#[derive(sqlx::FromRow)]
pub(crate) struct DiaryInfoRow {
    pub id: i64,
    pub diary_name: String,
    pub load_date: DateTime<Utc>,
    pub record_count: i32,
    pub notes: Option<String>,
    pub status: i16,
}

impl TryFrom<DiaryInfoRow> for DiaryInfo {
    type Error = DiaryError;

    fn try_from(row: DiaryInfoRow) -> Result<Self, Self::Error> {
        let status =
            DiaryStatus::from_code(row.status).ok_or(DiaryError::InvalidStatus {
                id: row.id,
                code: row.status,
            })?;
        Ok(DiaryInfo {
            id: row.id,
            name: row.diary_name,
            load_date: row.load_date,
            record_count: row.record_count,
            notes: row.notes,
            status,
        })
    }
}

/// A persisted diary record: the file fields plus its reconciliation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StoredRecord {
    pub record_id: i64,
    pub diary_info_id: i64,
    pub disposal_diary_id: String,
    pub tbl_name: String,
    pub idr_typ: String,
    pub idr_col_name: String,
    pub idr_value: String,
    pub juris: String,
    pub found: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct FieldMapping {
    pub idr_col_name: String,
    pub actual_col_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct FolderMapping {
    pub tbl_name: String,
    pub actual_folder_name: String,
}
