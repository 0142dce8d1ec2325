pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::DiaryFormatError;
pub use model::{DiaryLayout, DiaryRecord, ParsedDiary, FIELD_SEPARATOR, UNKNOWN_DIARY_NAME};
pub use registry::{parse_diary_file, parse_with_layout, RecordFormat};

#[cfg(test)]
mod tests;
