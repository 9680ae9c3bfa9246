use crate::domain::model::{EmailMessage, ReportRow};
use crate::utils::error::Result;

/// Where the importer hands off valid rows.
pub trait ReportStore: Send + Sync {
    /// Persists `rows` as one unit. Returns how many rows were newly stored;
    /// rows already stored for the same `(source, line)` are not counted.
    fn save_rows(
        &self,
        source: &str,
        rows: &[ReportRow],
    ) -> impl std::future::Future<Output = Result<u64>> + Send;
}

pub trait Mailer: Send + Sync {
    fn send(&self, message: &EmailMessage) -> impl std::future::Future<Output = Result<()>> + Send;
}
