use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DiaryFormatError;
use crate::formats::schema::{CURRENT_V13_COLUMNS, LEGACY_V11_COLUMNS};

/// Separator between fields of a content line.
pub const FIELD_SEPARATOR: char = '\u{1}';

/// Diary name used when the header carries no comma.
pub const UNKNOWN_DIARY_NAME: &str = "Unknown";

/// Column layout of the content lines. The layout is fixed for a whole file
/// and chosen before parsing starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiaryLayout {
    /// Original eleven-column layout without identifier validity dates.
    V11,
    #[default]
    V13,
}

impl DiaryLayout {
    pub const CURRENT: DiaryLayout = DiaryLayout::V13;

    pub fn as_str(&self) -> &'static str {
        match self {
            DiaryLayout::V11 => "v11",
            DiaryLayout::V13 => "v13",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            DiaryLayout::V11 => &LEGACY_V11_COLUMNS,
            DiaryLayout::V13 => &CURRENT_V13_COLUMNS,
        }
    }

    pub fn width(&self) -> usize {
        self.columns().len()
    }
}

impl fmt::Display for DiaryLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiaryLayout {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "v11" | "11" | "legacy" => Ok(DiaryLayout::V11),
            "v13" | "13" | "current" => Ok(DiaryLayout::V13),
            other => Err(format!("unknown diary layout '{other}'")),
        }
    }
}

/// One content line of a diary file. The owning diary id is not part of the
/// file; it is attached when the record is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryRecord {
    pub disposal_diary_id: String,
    pub gdp_tnt: String,
    pub rec_typ_id: String,
    pub platfrm: String,
    pub disposal_ind: String,
    pub disposal_run_dt: String,
    pub tbl_name: String,
    pub idr_typ: String,
    pub idr_col_name: String,
    pub idr_value: String,
    /// Only present in the V13 layout.
    pub idr_start_dt: Option<String>,
    /// Only present in the V13 layout.
    pub idr_end_dt: Option<String>,
    pub juris: String,
}

impl DiaryRecord {
    /// Number of file columns this record was built from.
    pub fn width(&self) -> usize {
        match (&self.idr_start_dt, &self.idr_end_dt) {
            (None, None) => DiaryLayout::V11.width(),
            (Some(_), Some(_)) => DiaryLayout::V13.width(),
            _ => DiaryLayout::V11.width() + 1,
        }
    }

    pub fn matches_layout(&self, layout: DiaryLayout) -> bool {
        self.width() == layout.width()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDiary {
    pub diary_name: String,
    pub layout: DiaryLayout,
    /// Count carried by the footer line.
    pub declared_count: usize,
    pub records: Vec<DiaryRecord>,
}

impl ParsedDiary {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Re-checks the invariants the parser established: the footer count
    /// matches and every record has the width of the chosen layout.
    pub fn verify(&self) -> Result<(), DiaryFormatError> {
        if self.declared_count != self.records.len() {
            return Err(DiaryFormatError::RecordCountMismatch {
                declared: self.declared_count,
                actual: self.records.len(),
            });
        }

        for (index, record) in self.records.iter().enumerate() {
            if !record.matches_layout(self.layout) {
                return Err(DiaryFormatError::ColumnCount {
                    layout: self.layout.as_str(),
                    line_number: index + 2,
                    expected: self.layout.width(),
                    found: record.width(),
                });
            }
        }

        Ok(())
    }
}
