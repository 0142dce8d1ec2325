// crates/diary-core/src/mappings.rs

use std::collections::HashMap;

use tracing::info;

use crate::db::DbPool;
use crate::error::{is_unique_violation, DiaryError, Result};
use crate::types::{FieldMapping, FolderMapping};

#[derive(Debug, Clone, Copy)]
struct LookupTable {
    table: &'static str,
    primary_key: &'static str,
    key_column: &'static str,
    value_column: &'static str,
}

const COLUMN_LOOKUP: LookupTable = LookupTable {
    table: "column_lookup",
    primary_key: "column_lookup_pkey",
    key_column: "idr_col_name",
    value_column: "actual_col_name",
};

const FOLDER_LOOKUP: LookupTable = LookupTable {
    table: "folder_lookup",
    primary_key: "folder_lookup_pkey",
    key_column: "tbl_name",
    value_column: "actual_folder_name",
};

/// Lookup tables translating diary identifiers to archive identifiers:
/// diary column names to archive field names, and diary table names to
/// archive-group folders. Mappings are never edited in place; delete and
/// add again to change one.
#[derive(Debug, Clone)]
pub struct MappingRegistry {
    pool: DbPool,
}

impl MappingRegistry {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn add_field_mapping(&self, idr_col_name: &str, actual_col_name: &str) -> Result<()> {
        insert(&self.pool, COLUMN_LOOKUP, idr_col_name, actual_col_name).await
    }

    pub async fn get_field_mapping(&self, idr_col_name: &str) -> Result<Option<String>> {
        lookup(&self.pool, COLUMN_LOOKUP, idr_col_name).await
    }

    pub async fn list_field_mappings(&self) -> Result<Vec<FieldMapping>> {
        let rows = sqlx::query_as::<_, FieldMapping>(
            "SELECT idr_col_name, actual_col_name FROM column_lookup ORDER BY idr_col_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Returns whether a mapping was removed.
    pub async fn delete_field_mapping(&self, idr_col_name: &str) -> Result<bool> {
        delete(&self.pool, COLUMN_LOOKUP, idr_col_name).await
    }

    pub async fn add_folder_mapping(&self, tbl_name: &str, actual_folder_name: &str) -> Result<()> {
        insert(&self.pool, FOLDER_LOOKUP, tbl_name, actual_folder_name).await
    }

    pub async fn get_folder_mapping(&self, tbl_name: &str) -> Result<Option<String>> {
        lookup(&self.pool, FOLDER_LOOKUP, tbl_name).await
    }

    pub async fn list_folder_mappings(&self) -> Result<Vec<FolderMapping>> {
        let rows = sqlx::query_as::<_, FolderMapping>(
            "SELECT tbl_name, actual_folder_name FROM folder_lookup ORDER BY tbl_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn delete_folder_mapping(&self, tbl_name: &str) -> Result<bool> {
        delete(&self.pool, FOLDER_LOOKUP, tbl_name).await
    }

    /// Snapshot of both tables, used for one reconciliation pass.
    pub async fn snapshot(&self) -> Result<MappingSnapshot> {
        let fields = self
            .list_field_mappings()
            .await?
            .into_iter()
            .map(|m| (m.idr_col_name, m.actual_col_name))
            .collect();
        let folders = self
            .list_folder_mappings()
            .await?
            .into_iter()
            .map(|m| (m.tbl_name, m.actual_folder_name))
            .collect();
        Ok(MappingSnapshot { fields, folders })
    }
}

/// In-memory copy of the lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingSnapshot {
    pub fields: HashMap<String, String>,
    pub folders: HashMap<String, String>,
}

impl MappingSnapshot {
    pub fn field(&self, idr_col_name: &str) -> Option<&str> {
        self.fields.get(idr_col_name).map(String::as_str)
    }

    pub fn folder(&self, tbl_name: &str) -> Option<&str> {
        self.folders.get(tbl_name).map(String::as_str)
    }
}

async fn insert(pool: &DbPool, table: LookupTable, key: &str, value: &str) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} ({}, {}) VALUES ($1, $2)",
        table.table, table.key_column, table.value_column
    );

    match sqlx::query(&sql).bind(key).bind(value).execute(pool).await {
        Ok(_) => {
            info!(table = table.table, key, value, "Added mapping");
            Ok(())
        }
        Err(err) if is_unique_violation(&err, table.primary_key) => Err(DiaryError::MappingExists {
            table: table.table,
            key: key.to_string(),
        }),
        Err(err) => Err(err.into()),
    }
}

async fn lookup(pool: &DbPool, table: LookupTable, key: &str) -> Result<Option<String>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        table.value_column, table.table, table.key_column
    );

    let value = sqlx::query_scalar::<_, String>(&sql)
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

async fn delete(pool: &DbPool, table: LookupTable, key: &str) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE {} = $1", table.table, table.key_column);

    let removed = sqlx::query(&sql).bind(key).execute(pool).await?.rows_affected() > 0;
    if removed {
        info!(table = table.table, key, "Deleted mapping");
    }
    Ok(removed)
}
