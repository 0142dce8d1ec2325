use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use diary_core::ingestion::IngestionReceipt;
use diary_core::reconciliation::ReconciliationReport;
use diary_core::types::{DiaryInfo, FieldMapping, FolderMapping};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn diaries_table(diaries: &[DiaryInfo]) -> Table {
    let mut table = table(vec![
        "ID",
        "Diary name",
        "Load date (UTC)",
        "Records",
        "Status",
        "Notes",
    ]);
    for diary in diaries {
        table.add_row(vec![
            diary.id.to_string(),
            diary.name.clone(),
            diary.load_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            diary.record_count.to_string(),
            diary.status.to_string(),
            diary.notes.clone().unwrap_or_default(),
        ]);
    }
    table
}

pub fn field_mappings_table(mappings: &[FieldMapping]) -> Table {
    let mut table = table(vec!["IDR column", "Archive field"]);
    for mapping in mappings {
        table.add_row(vec![&mapping.idr_col_name, &mapping.actual_col_name]);
    }
    table
}

pub fn folder_mappings_table(mappings: &[FolderMapping]) -> Table {
    let mut table = table(vec!["Table", "Archive folder"]);
    for mapping in mappings {
        table.add_row(vec![&mapping.tbl_name, &mapping.actual_folder_name]);
    }
    table
}

pub fn receipt_line(receipt: &IngestionReceipt) -> String {
    format!(
        "{} records processed and linked to diary ID {} ({}, layout {}).",
        receipt.record_count, receipt.diary_id, receipt.diary_name, receipt.layout
    )
}

pub fn report_table(report: &ReconciliationReport) -> Table {
    let mut table = table(vec!["Diary", "Total", "Checked", "Found", "Not found", "Skipped", "Failed"]);
    table.add_row(vec![
        format!("{} ({})", report.diary_name, report.diary_id),
        report.total.to_string(),
        report.checked.to_string(),
        report.found.to_string(),
        report.not_found.to_string(),
        report.skipped.to_string(),
        report.failed.to_string(),
    ]);
    table
}
