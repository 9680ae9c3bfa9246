pub mod importer;
pub mod orders;
pub mod users;

pub use crate::domain::model::{ImportSummary, Order, OrderReceipt, ReportRow, UserView};
pub use crate::domain::ports::{Mailer, ReportStore};
pub use crate::utils::error::Result;
