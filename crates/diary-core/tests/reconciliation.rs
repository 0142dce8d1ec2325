mod common;

use anyhow::Result;
use common::ArchiveStub;
use diary_core::checker::CheckTarget;
use diary_core::ingestion::{load_diary, LoadOptions};
use diary_core::reconciliation::{check_records_exist, MissingMapping};
use diary_core::store::DiaryStore;
use diary_core::DiaryError;

async fn found_flags(store: &DiaryStore, diary_id: i64) -> Result<Vec<(String, bool)>> {
    Ok(store
        .diary_records(diary_id)
        .await?
        .into_iter()
        .map(|r| (r.idr_value, r.found))
        .collect())
}

#[tokio::test]
async fn reconciliation_requires_a_pending_diary() -> Result<()> {
    let Some(db) = common::test_db("reconciliation_requires_a_pending_diary").await? else {
        return Ok(());
    };

    let checker = ArchiveStub::with_values(&[]);
    let err = check_records_exist(&db.store, &db.registry, &checker)
        .await
        .unwrap_err();
    assert!(matches!(err, DiaryError::NoActiveDiary));
    assert!(checker.calls().is_empty());

    Ok(())
}

#[tokio::test]
async fn mapped_records_are_checked_and_flagged() -> Result<()> {
    let Some(db) = common::test_db("mapped_records_are_checked_and_flagged").await? else {
        return Ok(());
    };
    let (store, registry) = (&db.store, &db.registry);

    let receipt = load_diary(
        store,
        &common::fixture_path("valid/BATCH1"),
        &LoadOptions::default(),
    )
    .await?;
    registry.add_field_mapping("ACCT_NO", "ACCOUNT_NUMBER").await?;
    registry
        .add_folder_mapping("CUSTOMER_ACCT", "ARCH_CUSTOMER")
        .await?;

    let checker = ArchiveStub::with_values(&["10001"]);
    let report = check_records_exist(store, registry, &checker).await?;

    assert_eq!(report.diary_id, receipt.diary_id);
    assert_eq!(report.total, 3);
    assert_eq!(report.checked, 2);
    assert_eq!(report.found, 1);
    assert_eq!(report.not_found, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped_records[0].tbl_name, "LOAN_BOOK");
    assert_eq!(report.skipped_records[0].missing, MissingMapping::FolderAndField);

    assert_eq!(
        checker.calls(),
        vec![
            CheckTarget {
                folder: "ARCH_CUSTOMER".into(),
                field: "ACCOUNT_NUMBER".into(),
                value: "10001".into(),
            },
            CheckTarget {
                folder: "ARCH_CUSTOMER".into(),
                field: "ACCOUNT_NUMBER".into(),
                value: "10002".into(),
            },
        ]
    );

    let first_pass = found_flags(store, receipt.diary_id).await?;
    assert_eq!(
        first_pass,
        vec![
            ("10001".to_string(), true),
            ("10002".to_string(), false),
            ("L-77".to_string(), false),
        ]
    );

    // A second pass re-checks every record and lands on the same flags.
    let again = check_records_exist(store, registry, &checker).await?;
    assert_eq!(again.found, 1);
    assert_eq!(checker.calls().len(), 4);
    assert_eq!(found_flags(store, receipt.diary_id).await?, first_pass);

    Ok(())
}

#[tokio::test]
async fn checker_failures_leave_flags_unchanged() -> Result<()> {
    let Some(db) = common::test_db("checker_failures_leave_flags_unchanged").await? else {
        return Ok(());
    };
    let (store, registry) = (&db.store, &db.registry);

    let receipt = load_diary(
        store,
        &common::fixture_path("valid/BATCH2"),
        &LoadOptions::default(),
    )
    .await?;
    registry.add_field_mapping("ACCT_NO", "ACCOUNT_NUMBER").await?;
    registry
        .add_folder_mapping("CUSTOMER_ACCT", "ARCH_CUSTOMER")
        .await?;

    store
        .mark_found(receipt.diary_id, "CUSTOMER_ACCT", "ACCT_NO", "20001")
        .await?;

    let report = check_records_exist(store, registry, &ArchiveStub::failing()).await?;
    assert_eq!(report.checked, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(report.found, 0);

    assert_eq!(
        found_flags(store, receipt.diary_id).await?,
        vec![("20001".to_string(), true), ("20002".to_string(), false)]
    );

    Ok(())
}
