// Adapters layer: concrete implementations for external systems (database, mail, http).

pub mod db;
pub mod http;
pub mod mailer;
pub mod report_store;

pub use mailer::LogMailer;
pub use report_store::SqlReportStore;
