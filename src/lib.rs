pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{LogMailer, SqlReportStore};
pub use config::AppConfig;
pub use crate::core::{importer::ReportImporter, orders::OrderManager, users::UserService};
pub use utils::error::{AppError, Result};
