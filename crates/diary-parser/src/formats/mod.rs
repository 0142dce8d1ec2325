mod common;
mod current_v13;
mod envelope;
mod legacy_v11;
pub(crate) mod schema;

pub use current_v13::CurrentV13Format;
pub use legacy_v11::LegacyV11Format;

pub(crate) use common::split_fields;
pub(crate) use envelope::{base_file_name, parse_footer, parse_header, split_lines};
