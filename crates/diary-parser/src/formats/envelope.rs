use std::path::Path;

use crate::errors::DiaryFormatError;
use crate::model::UNKNOWN_DIARY_NAME;

const HEADER_TYPE: &str = "H";
const FOOTER_TYPE: &str = "T";

/// Splits the file into lines, accepting `\r\n` terminators. One trailing
/// terminator at the end of the file does not produce an extra line.
pub(crate) fn split_lines(content: &str) -> Vec<&str> {
    let body = match content.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => content,
    };

    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Extracts the diary name from `H,<diary_name>`. A header without a comma
/// falls back to [`UNKNOWN_DIARY_NAME`].
pub(crate) fn parse_header(line: &str) -> Result<String, DiaryFormatError> {
    let mut fields = line.split(',');
    let record_type = fields.next().unwrap_or_default();
    if record_type != HEADER_TYPE {
        return Err(DiaryFormatError::InvalidHeader {
            message: format!("expected record type '{HEADER_TYPE}', found '{record_type}'"),
        });
    }

    Ok(fields
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_DIARY_NAME.to_string()))
}

/// Extracts the declared record count from `T,<count>,...`.
pub(crate) fn parse_footer(line: &str) -> Result<usize, DiaryFormatError> {
    let mut fields = line.split(',');
    let record_type = fields.next().unwrap_or_default();
    if record_type != FOOTER_TYPE {
        return Err(DiaryFormatError::InvalidFooter {
            message: format!("expected record type '{FOOTER_TYPE}', found '{record_type}'"),
        });
    }

    let raw_count = fields.next().ok_or_else(|| DiaryFormatError::InvalidFooter {
        message: "missing record count".to_string(),
    })?;

    raw_count
        .trim()
        .parse::<usize>()
        .map_err(|_| DiaryFormatError::InvalidFooter {
            message: format!("record count '{raw_count}' is not a non-negative integer"),
        })
}

pub(crate) fn base_file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}
