use serde::Serialize;
use tracing::{debug, info, warn};

use crate::checker::{CheckTarget, CheckVerdict, ExistenceChecker};
use crate::error::{DiaryError, Result};
use crate::mappings::{MappingRegistry, MappingSnapshot};
use crate::store::DiaryStore;
use crate::types::{DiaryInfo, StoredRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMapping {
    Folder,
    Field,
    FolderAndField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedCheck {
    Ready(CheckTarget),
    Skipped(MissingMapping),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Found,
    NotFound,
    Skipped { missing: MissingMapping },
    CheckFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub record_id: i64,
    pub tbl_name: String,
    pub idr_col_name: String,
    pub missing: MissingMapping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub diary_id: i64,
    pub diary_name: String,
    pub total: usize,
    /// Records the checker was invoked for.
    pub checked: usize,
    pub found: usize,
    pub not_found: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_records: Vec<SkippedRecord>,
}

impl ReconciliationReport {
    fn new(diary: &DiaryInfo, total: usize) -> Self {
        Self {
            diary_id: diary.id,
            diary_name: diary.name.clone(),
            total,
            checked: 0,
            found: 0,
            not_found: 0,
            skipped: 0,
            failed: 0,
            skipped_records: Vec::new(),
        }
    }

    fn tally(&mut self, record: &StoredRecord, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Found => {
                self.checked += 1;
                self.found += 1;
            }
            RecordOutcome::NotFound => {
                self.checked += 1;
                self.not_found += 1;
            }
            RecordOutcome::CheckFailed { .. } => {
                self.checked += 1;
                self.failed += 1;
            }
            RecordOutcome::Skipped { missing } => {
                self.skipped += 1;
                self.skipped_records.push(SkippedRecord {
                    record_id: record.record_id,
                    tbl_name: record.tbl_name.clone(),
                    idr_col_name: record.idr_col_name.clone(),
                    missing: *missing,
                });
            }
        }
    }
}

/// Resolves the archive folder and field for `record`.
pub fn plan_check(record: &StoredRecord, mappings: &MappingSnapshot) -> PlannedCheck {
    match (
        mappings.folder(&record.tbl_name),
        mappings.field(&record.idr_col_name),
    ) {
        (Some(folder), Some(field)) => PlannedCheck::Ready(CheckTarget {
            folder: folder.to_string(),
            field: field.to_string(),
            value: record.idr_value.clone(),
        }),
        (None, Some(_)) => PlannedCheck::Skipped(MissingMapping::Folder),
        (Some(_), None) => PlannedCheck::Skipped(MissingMapping::Field),
        (None, None) => PlannedCheck::Skipped(MissingMapping::FolderAndField),
    }
}

/// Checks every record of the pending diary against the archive.
///
/// One checker invocation per mapped record, in insertion order. Records the
/// archive confirms are flagged found; every other outcome leaves the flag
/// as it was, so running the pass again re-checks everything.
pub async fn check_records_exist(
    store: &DiaryStore,
    registry: &MappingRegistry,
    checker: &dyn ExistenceChecker,
) -> Result<ReconciliationReport> {
    let diary = store.active_diary().await?.ok_or(DiaryError::NoActiveDiary)?;
    let records = store.diary_records(diary.id).await?;
    let mappings = registry.snapshot().await?;

    info!(
        diary_id = diary.id,
        diary_name = %diary.name,
        records = records.len(),
        "Starting reconciliation"
    );

    let mut report = ReconciliationReport::new(&diary, records.len());
    for record in &records {
        let outcome = reconcile_record(store, checker, &mappings, record).await?;
        report.tally(record, &outcome);
    }

    info!(
        diary_id = report.diary_id,
        checked = report.checked,
        found = report.found,
        not_found = report.not_found,
        skipped = report.skipped,
        failed = report.failed,
        "Reconciliation finished"
    );

    Ok(report)
}

async fn reconcile_record(
    store: &DiaryStore,
    checker: &dyn ExistenceChecker,
    mappings: &MappingSnapshot,
    record: &StoredRecord,
) -> Result<RecordOutcome> {
    let target = match plan_check(record, mappings) {
        PlannedCheck::Ready(target) => target,
        PlannedCheck::Skipped(missing) => {
            warn!(
                record_id = record.record_id,
                tbl_name = %record.tbl_name,
                idr_col_name = %record.idr_col_name,
                ?missing,
                "No mapping for record; skipping"
            );
            return Ok(RecordOutcome::Skipped { missing });
        }
    };

    match checker.check(&target).await {
        Ok(CheckVerdict::Found) => {
            store
                .mark_found(
                    record.diary_info_id,
                    &record.tbl_name,
                    &record.idr_col_name,
                    &record.idr_value,
                )
                .await?;
            debug!(record_id = record.record_id, "Record found in archive");
            Ok(RecordOutcome::Found)
        }
        Ok(CheckVerdict::NotFound) => {
            debug!(record_id = record.record_id, "Record not found in archive");
            Ok(RecordOutcome::NotFound)
        }
        Err(err) => {
            warn!(
                record_id = record.record_id,
                folder = %target.folder,
                error = %err,
                "Existence check failed; leaving record unchanged"
            );
            Ok(RecordOutcome::CheckFailed {
                reason: err.to_string(),
            })
        }
    }
}
