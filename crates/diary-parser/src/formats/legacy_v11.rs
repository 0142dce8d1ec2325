use crate::errors::DiaryFormatError;
use crate::model::{DiaryLayout, DiaryRecord};
use crate::registry::RecordFormat;

use super::split_fields;

/// Eleven-column content lines from before identifier validity dates were
/// added to the feed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyV11Format;

impl RecordFormat for LegacyV11Format {
    fn layout(&self) -> DiaryLayout {
        DiaryLayout::V11
    }

    fn parse_line(&self, line_number: usize, line: &str) -> Result<DiaryRecord, DiaryFormatError> {
        let fields = split_fields(self.layout(), line_number, line)?;

        Ok(DiaryRecord {
            disposal_diary_id: fields[0].to_string(),
            gdp_tnt: fields[1].to_string(),
            rec_typ_id: fields[2].to_string(),
            platfrm: fields[3].to_string(),
            disposal_ind: fields[4].to_string(),
            disposal_run_dt: fields[5].to_string(),
            tbl_name: fields[6].to_string(),
            idr_typ: fields[7].to_string(),
            idr_col_name: fields[8].to_string(),
            idr_value: fields[9].to_string(),
            idr_start_dt: None,
            idr_end_dt: None,
            juris: fields[10].to_string(),
        })
    }
}
