use std::path::Path;

use diary_parser::{parse_with_layout, DiaryFormatError, DiaryLayout};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{DiaryError, Result};
use crate::store::DiaryStore;

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub layout: DiaryLayout,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionReceipt {
    pub diary_id: i64,
    pub diary_name: String,
    pub record_count: usize,
    pub layout: DiaryLayout,
}

/// Loads the diary file at `path` as the new pending diary.
pub async fn load_diary(
    store: &DiaryStore,
    path: &Path,
    options: &LoadOptions,
) -> Result<IngestionReceipt> {
    let bytes = tokio::fs::read(path).await?;
    let Ok(content) = std::str::from_utf8(&bytes) else {
        warn!(path = %path.display(), "Diary file is not valid UTF-8");
        return Err(DiaryFormatError::NotUtf8.into());
    };

    load_diary_content(store, content, &path.to_string_lossy(), options).await
}

/// Validates `content` and stores it as one pending diary.
///
/// Nothing is persisted unless the whole batch validates, no other diary is
/// pending, and every record insert succeeds. The diary row and its records
/// are written in a single transaction.
pub async fn load_diary_content(
    store: &DiaryStore,
    content: &str,
    file_name: &str,
    options: &LoadOptions,
) -> Result<IngestionReceipt> {
    let parsed = match parse_with_layout(content, file_name, options.layout) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(file_name, error = %err, "Diary file failed validation");
            return Err(err.into());
        }
    };

    if let Some(active) = store.active_diary().await? {
        warn!(
            active_id = active.id,
            active_name = %active.name,
            diary_name = %parsed.diary_name,
            "Refusing to load while another diary is pending"
        );
        return Err(DiaryError::DuplicateActiveDiary {
            active_id: active.id,
            active_name: active.name,
        });
    }

    parsed.verify()?;

    let mut tx = store.begin().await?;
    let diary_id = store
        .begin_diary(
            &mut tx,
            &parsed.diary_name,
            parsed.record_count(),
            options.notes.as_deref(),
        )
        .await?;

    if let Err(source) = store.append_records(&mut tx, diary_id, &parsed.records).await {
        error!(diary_id, error = %source, "Record insert failed; rolling back diary");
        if let Err(rollback_err) = tx.rollback().await {
            warn!(diary_id, error = %rollback_err, "Rollback failed; connection will discard the transaction");
        }
        return Err(DiaryError::PartialInsert {
            diary_name: parsed.diary_name,
            source,
        });
    }

    if let Err(source) = tx.commit().await {
        // The commit outcome is unknown; make sure no half-loaded diary survives.
        error!(diary_id, error = %source, "Commit failed; removing diary");
        if let Err(abort_err) = store.abort_diary(diary_id).await {
            error!(diary_id, error = %abort_err, "Compensating delete failed");
        }
        return Err(DiaryError::PartialInsert {
            diary_name: parsed.diary_name,
            source,
        });
    }

    info!(
        diary_id,
        diary_name = %parsed.diary_name,
        record_count = parsed.record_count(),
        layout = %parsed.layout,
        "Diary loaded"
    );

    Ok(IngestionReceipt {
        diary_id,
        record_count: parsed.record_count(),
        layout: parsed.layout,
        diary_name: parsed.diary_name,
    })
}
