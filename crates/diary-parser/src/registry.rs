use crate::errors::DiaryFormatError;
use crate::formats::{
    base_file_name, parse_footer, parse_header, split_lines, CurrentV13Format, LegacyV11Format,
};
use crate::model::{DiaryLayout, DiaryRecord, ParsedDiary};

pub trait RecordFormat {
    fn layout(&self) -> DiaryLayout;
    fn parse_line(&self, line_number: usize, line: &str) -> Result<DiaryRecord, DiaryFormatError>;
}

/// Parses a diary file in the current layout. `file_name` may be a full
/// path; only its last component is compared with the header's diary name.
pub fn parse_diary_file(content: &str, file_name: &str) -> Result<ParsedDiary, DiaryFormatError> {
    parse_with_layout(content, file_name, DiaryLayout::CURRENT)
}

pub fn parse_with_layout(
    content: &str,
    file_name: &str,
    layout: DiaryLayout,
) -> Result<ParsedDiary, DiaryFormatError> {
    let format = format_for(layout);

    let lines = split_lines(content);
    if lines.len() < 2 {
        return Err(DiaryFormatError::TooFewLines { lines: lines.len() });
    }

    let header = lines[0];
    let footer = lines[lines.len() - 1];
    let content_lines = &lines[1..lines.len() - 1];

    let diary_name = parse_header(header)?;
    let declared_count = parse_footer(footer)?;
    if declared_count != content_lines.len() {
        return Err(DiaryFormatError::RecordCountMismatch {
            declared: declared_count,
            actual: content_lines.len(),
        });
    }

    let base_name = base_file_name(file_name);
    if base_name != diary_name {
        return Err(DiaryFormatError::FilenameMismatch {
            diary_name,
            file_name: base_name.to_string(),
        });
    }

    // File line numbers: the header is line 1.
    let records = content_lines
        .iter()
        .enumerate()
        .map(|(index, line)| format.parse_line(index + 2, line))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedDiary {
        diary_name,
        layout: format.layout(),
        declared_count,
        records,
    })
}

fn format_for(layout: DiaryLayout) -> &'static dyn RecordFormat {
    static LEGACY_V11: LegacyV11Format = LegacyV11Format;
    static CURRENT_V13: CurrentV13Format = CurrentV13Format;

    match layout {
        DiaryLayout::V11 => &LEGACY_V11,
        DiaryLayout::V13 => &CURRENT_V13,
    }
}
