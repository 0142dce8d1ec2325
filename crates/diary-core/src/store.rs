use diary_parser::DiaryRecord;
use sqlx::{Connection, PgExecutor, Postgres, Transaction};
use tracing::{info, warn};

use crate::db::DbPool;
use crate::error::{is_unique_violation, DiaryError, Result};
use crate::types::{DiaryInfo, DiaryInfoRow, DiaryOutcome, DiaryStatus, StoredRecord};

/// Partial unique index that admits a single PENDING diary.
pub const SINGLE_PENDING_INDEX: &str = "uq_single_pending_diary";
pub const DIARY_NAME_CONSTRAINT: &str = "uq_diary_name";

const DIARY_COLUMNS: &str = "id, diary_name, load_date, record_count, notes, status";

/// Persistence for diaries and their records.
///
/// The "one pending diary" rule lives in the schema, so it holds for every
/// process sharing the database, not just this handle.
#[derive(Debug, Clone)]
pub struct DiaryStore {
    pool: DbPool,
}

impl DiaryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Inserts a PENDING diary inside `tx` and returns its id.
    ///
    /// The insert is the check: if another diary is pending the single-pending
    /// index rejects it and nothing is written. The insert runs in a savepoint
    /// so the holder can be read back on the same connection.
    pub async fn begin_diary(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        record_count: usize,
        notes: Option<&str>,
    ) -> Result<i64> {
        let record_count = stored_record_count(record_count)?;

        let mut savepoint = Connection::begin(&mut **tx).await?;
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
                INSERT INTO disposal_diary_info (diary_name, load_date, record_count, notes, status)
                VALUES ($1, now(), $2, $3, $4)
                RETURNING id
            "#,
        )
        .bind(name)
        .bind(record_count)
        .bind(notes)
        .bind(DiaryStatus::Pending.code())
        .fetch_one(&mut *savepoint)
        .await;

        let err = match inserted {
            Ok(id) => {
                savepoint.commit().await?;
                info!(diary_id = id, diary_name = name, record_count, "Created pending diary");
                return Ok(id);
            }
            Err(err) => {
                savepoint.rollback().await?;
                err
            }
        };

        if is_unique_violation(&err, SINGLE_PENDING_INDEX) {
            let mut rows = pending_rows(&mut **tx).await?;
            return match rows.pop() {
                Some(active) => Err(DiaryError::DuplicateActiveDiary {
                    active_id: active.id,
                    active_name: active.diary_name,
                }),
                None => Err(DiaryError::PendingSlotTaken),
            };
        }
        if is_unique_violation(&err, DIARY_NAME_CONSTRAINT) {
            return Err(DiaryError::DuplicateDiaryName(name.to_string()));
        }
        Err(err.into())
    }

    /// Inserts `records` for `diary_id` inside `tx`, preserving file order.
    pub async fn append_records(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        diary_id: i64,
        records: &[DiaryRecord],
    ) -> std::result::Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for record in records {
            inserted += sqlx::query(
                r#"
                    INSERT INTO disposal_diary_records (
                        disposal_diary_id, gdp_tnt, rec_typ_id, platfrm, disposal_ind,
                        disposal_run_dt, tbl_name, idr_typ, idr_col_name, idr_value,
                        idr_start_dt, idr_end_dt, juris, diary_info_id
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(&record.disposal_diary_id)
            .bind(&record.gdp_tnt)
            .bind(&record.rec_typ_id)
            .bind(&record.platfrm)
            .bind(&record.disposal_ind)
            .bind(&record.disposal_run_dt)
            .bind(&record.tbl_name)
            .bind(&record.idr_typ)
            .bind(&record.idr_col_name)
            .bind(&record.idr_value)
            .bind(&record.idr_start_dt)
            .bind(&record.idr_end_dt)
            .bind(&record.juris)
            .bind(diary_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();
        }
        Ok(inserted)
    }

    /// Compensating delete for a diary whose load did not complete. Missing
    /// rows are not an error. Returns the number of records removed.
    pub async fn abort_diary(&self, diary_id: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let (records, diaries) = delete_diary_rows(&mut tx, diary_id).await?;
        tx.commit().await?;

        warn!(diary_id, records, diaries, "Aborted diary load");
        Ok(records)
    }

    /// Deletes a diary and all of its records. Returns the number of records
    /// removed, which may be zero.
    pub async fn delete_diary(&self, diary_id: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let (records, diaries) = delete_diary_rows(&mut tx, diary_id).await?;
        if diaries == 0 {
            tx.rollback().await?;
            return Err(DiaryError::DiaryNotFound(diary_id));
        }
        tx.commit().await?;

        info!(diary_id, records, "Deleted diary");
        Ok(records)
    }

    /// The pending diary, if any. More than one pending row is reported as a
    /// consistency error rather than resolved.
    pub async fn active_diary(&self) -> Result<Option<DiaryInfo>> {
        let mut rows = pending_rows(&self.pool).await?;

        match rows.len() {
            0 | 1 => rows.pop().map(DiaryInfo::try_from).transpose(),
            n => Err(DiaryError::MultipleActiveDiaries(n as i64)),
        }
    }

    pub async fn list_diaries(&self) -> Result<Vec<DiaryInfo>> {
        let rows = sqlx::query_as::<_, DiaryInfoRow>(&format!(
            "SELECT {DIARY_COLUMNS} FROM disposal_diary_info ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DiaryInfo::try_from).collect()
    }

    pub async fn get_diary(&self, diary_id: i64) -> Result<Option<DiaryInfo>> {
        let row = sqlx::query_as::<_, DiaryInfoRow>(&format!(
            "SELECT {DIARY_COLUMNS} FROM disposal_diary_info WHERE id = $1"
        ))
        .bind(diary_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DiaryInfo::try_from).transpose()
    }

    /// Moves a PENDING diary to its terminal status, freeing the pending slot.
    pub async fn close_diary(&self, diary_id: i64, outcome: DiaryOutcome) -> Result<DiaryInfo> {
        let row = sqlx::query_as::<_, DiaryInfoRow>(&format!(
            "UPDATE disposal_diary_info SET status = $1 WHERE id = $2 AND status = $3 RETURNING {DIARY_COLUMNS}"
        ))
        .bind(outcome.status().code())
        .bind(diary_id)
        .bind(DiaryStatus::Pending.code())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let diary = DiaryInfo::try_from(row)?;
                info!(diary_id, status = %diary.status, "Closed diary");
                Ok(diary)
            }
            None => match self.get_diary(diary_id).await? {
                Some(_) => Err(DiaryError::DiaryNotPending(diary_id)),
                None => Err(DiaryError::DiaryNotFound(diary_id)),
            },
        }
    }

    /// Records of a diary in insertion order.
    pub async fn diary_records(&self, diary_id: i64) -> Result<Vec<StoredRecord>> {
        let records = sqlx::query_as::<_, StoredRecord>(
            r#"
                SELECT record_id, diary_info_id, disposal_diary_id, tbl_name, idr_typ,
                       idr_col_name, idr_value, juris, found
                FROM disposal_diary_records
                WHERE diary_info_id = $1
                ORDER BY record_id
            "#,
        )
        .bind(diary_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Flags every record of `diary_id` matching the natural key as found.
    pub async fn mark_found(
        &self,
        diary_id: i64,
        tbl_name: &str,
        idr_col_name: &str,
        idr_value: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
                UPDATE disposal_diary_records
                SET found = TRUE
                WHERE diary_info_id = $1
                  AND tbl_name = $2
                  AND idr_col_name = $3
                  AND idr_value = $4
            "#,
        )
        .bind(diary_id)
        .bind(tbl_name)
        .bind(idr_col_name)
        .bind(idr_value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn pending_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM disposal_diary_info WHERE status = $1",
        )
        .bind(DiaryStatus::Pending.code())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn record_count(&self, diary_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM disposal_diary_records WHERE diary_info_id = $1",
        )
        .bind(diary_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

fn stored_record_count(record_count: usize) -> Result<i32> {
    i32::try_from(record_count).map_err(|_| DiaryError::BatchTooLarge {
        records: record_count,
        max: i32::MAX as usize,
    })
}

async fn pending_rows<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<DiaryInfoRow>> {
    let rows = sqlx::query_as::<_, DiaryInfoRow>(&format!(
        "SELECT {DIARY_COLUMNS} FROM disposal_diary_info WHERE status = $1 ORDER BY id"
    ))
    .bind(DiaryStatus::Pending.code())
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Children first, then the diary row.
async fn delete_diary_rows(
    tx: &mut Transaction<'_, Postgres>,
    diary_id: i64,
) -> Result<(u64, u64)> {
    let records = sqlx::query("DELETE FROM disposal_diary_records WHERE diary_info_id = $1")
        .bind(diary_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    let diaries = sqlx::query("DELETE FROM disposal_diary_info WHERE id = $1")
        .bind(diary_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    Ok((records, diaries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_count_must_fit_the_column() {
        assert_eq!(stored_record_count(3).unwrap(), 3);
        assert_eq!(
            stored_record_count(i32::MAX as usize).unwrap(),
            i32::MAX
        );

        let err = stored_record_count(i32::MAX as usize + 1).unwrap_err();
        assert!(matches!(
            err,
            DiaryError::BatchTooLarge { records, max }
                if records == i32::MAX as usize + 1 && max == i32::MAX as usize
        ));
        assert_eq!(err.exit_code(), 3);
    }
}
