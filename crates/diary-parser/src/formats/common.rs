use crate::errors::DiaryFormatError;
use crate::model::{DiaryLayout, FIELD_SEPARATOR};

/// Splits a content line on the field separator and checks the column count
/// against `layout`.
pub(crate) fn split_fields(
    layout: DiaryLayout,
    line_number: usize,
    line: &str,
) -> Result<Vec<&str>, DiaryFormatError> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() != layout.width() {
        return Err(DiaryFormatError::ColumnCount {
            layout: layout.as_str(),
            line_number,
            expected: layout.width(),
            found: fields.len(),
        });
    }
    Ok(fields)
}
