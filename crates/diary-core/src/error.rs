// crates/diary-core/src/error.rs

use diary_parser::DiaryFormatError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiaryError {
    #[error("diary file rejected: {0}")]
    Format(#[from] DiaryFormatError),

    #[error("diary has {records} records; at most {max} fit in one diary")]
    BatchTooLarge { records: usize, max: usize },

    #[error("diary '{active_name}' (id {active_id}) is still pending; close or delete it first")]
    DuplicateActiveDiary { active_id: i64, active_name: String },

    /// Raised when the single-pending index rejects an insert and the
    /// competing diary could not be read back.
    #[error("another diary is already pending")]
    PendingSlotTaken,

    #[error("a diary named '{0}' has already been loaded")]
    DuplicateDiaryName(String),

    #[error("inserting records for diary '{diary_name}' failed; nothing was kept: {source}")]
    PartialInsert {
        diary_name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("no pending diary to reconcile")]
    NoActiveDiary,

    #[error("consistency error: {0} diaries are pending, expected at most one")]
    MultipleActiveDiaries(i64),

    #[error("diary {0} not found")]
    DiaryNotFound(i64),

    #[error("diary {0} is not pending")]
    DiaryNotPending(i64),

    #[error("{table} already maps '{key}'; delete it before adding a new mapping")]
    MappingExists { table: &'static str, key: String },

    #[error("diary {id} has unknown status code {code}")]
    InvalidStatus { id: i64, code: i16 },

    #[error("Database query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DiaryError {
    /// Process exit code reported by the command-line front end.
    pub fn exit_code(&self) -> u8 {
        match self {
            DiaryError::Format(_) | DiaryError::BatchTooLarge { .. } => 3,
            DiaryError::DuplicateActiveDiary { .. }
            | DiaryError::PendingSlotTaken
            | DiaryError::DuplicateDiaryName(_) => 4,
            DiaryError::NoActiveDiary | DiaryError::MultipleActiveDiaries(_) => 5,
            DiaryError::DiaryNotFound(_)
            | DiaryError::DiaryNotPending(_)
            | DiaryError::MappingExists { .. } => 6,
            DiaryError::PartialInsert { .. }
            | DiaryError::InvalidStatus { .. }
            | DiaryError::Database(_)
            | DiaryError::Migration(_)
            | DiaryError::Io(_)
            | DiaryError::Config(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, DiaryError>;

/// Detect a Postgres unique constraint violation by name.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_separate_error_kinds() {
        let format = DiaryError::Format(DiaryFormatError::TooFewLines { lines: 1 });
        let duplicate = DiaryError::DuplicateActiveDiary {
            active_id: 1,
            active_name: "BATCH1".into(),
        };
        let consistency = DiaryError::MultipleActiveDiaries(2);

        assert_eq!(format.exit_code(), 3);
        assert_eq!(
            DiaryError::BatchTooLarge {
                records: usize::MAX,
                max: i32::MAX as usize,
            }
            .exit_code(),
            3
        );
        assert_eq!(duplicate.exit_code(), 4);
        assert_eq!(consistency.exit_code(), 5);
        assert_eq!(DiaryError::DiaryNotFound(9).exit_code(), 6);
        assert_eq!(DiaryError::Config("x".into()).exit_code(), 1);
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound, "uq_diary_name"));
    }
}
