use crate::domain::model::ReportRow;
use crate::domain::ports::ReportStore;
use crate::utils::error::Result;
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct SqlReportStore {
    pool: SqlitePool,
}

impl SqlReportStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count_rows(&self, source: &str) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM report_rows WHERE source = ?")
            .bind(source)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

impl ReportStore for SqlReportStore {
    async fn save_rows(&self, source: &str, rows: &[ReportRow]) -> Result<u64> {
        let imported_at = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for row in rows {
            let fields = serde_json::to_string(&row.fields)?;
            let result = sqlx::query(
                "INSERT INTO report_rows (source, line_no, fields, imported_at) \
                 VALUES (?, ?, ?, ?) \
                 ON CONFLICT (source, line_no) DO NOTHING",
            )
            .bind(source)
            .bind(row.line as i64)
            .bind(fields)
            .bind(imported_at)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        tracing::debug!("Stored {} of {} rows from {}", inserted, rows.len(), source);
        Ok(inserted)
    }
}
