use thiserror::Error;

/// Reasons a diary batch file is rejected. Any one of these aborts the whole
/// batch; the parser never yields a partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiaryFormatError {
    #[error("diary file needs a header and a footer line, found {lines} line(s)")]
    TooFewLines { lines: usize },

    #[error("header line invalid: {message}")]
    InvalidHeader { message: String },

    #[error("footer line invalid: {message}")]
    InvalidFooter { message: String },

    #[error("footer declares {declared} record(s) but the file contains {actual}")]
    RecordCountMismatch { declared: usize, actual: usize },

    #[error("file name '{file_name}' does not match diary name '{diary_name}'")]
    FilenameMismatch {
        diary_name: String,
        file_name: String,
    },

    #[error("{layout} line {line_number} has {found} column(s), expected {expected}")]
    ColumnCount {
        layout: &'static str,
        line_number: usize,
        expected: usize,
        found: usize,
    },

    #[error("diary file is not valid UTF-8")]
    NotUtf8,
}
