pub mod checker;
pub mod config;
pub mod db;
pub mod error;
pub mod ingestion;
pub mod mappings;
pub mod reconciliation;
pub mod store;
pub mod types;

pub use error::{DiaryError, Result};
