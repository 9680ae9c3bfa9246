use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Mail delivery failed: {message}")]
    MailError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Malformed row at line {line}: found {found} fields, expected at least {expected}")]
    MalformedRow {
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Order cannot be empty")]
    EmptyOrder,

    #[error("Unknown payment type: {0}")]
    UnknownPaymentType(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Unknown SKU: {0}")]
    UnknownSku(String),

    #[error("Insufficient stock for {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: String,
        requested: i64,
        available: i64,
    },

    #[error("User '{0}' already exists")]
    DuplicateUser(String),

    #[error("Order '{0}' already exists")]
    DuplicateOrder(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Infrastructure,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a failed CLI command. Never zero.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2, // 可重試
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::ValidationError { .. }
            | AppError::MalformedRow { .. }
            | AppError::InvalidPath { .. }
            | AppError::EmptyOrder
            | AppError::UnknownPaymentType(_)
            | AppError::InvalidEmail(_) => ErrorCategory::Validation,
            AppError::UnknownSku(_) => ErrorCategory::NotFound,
            AppError::InsufficientStock { .. }
            | AppError::DuplicateUser(_)
            | AppError::DuplicateOrder(_) => ErrorCategory::Conflict,
            AppError::ConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AppError::IoError(_)
            | AppError::CsvError(_)
            | AppError::DatabaseError(_)
            | AppError::MigrationError(_)
            | AppError::SerializationError(_)
            | AppError::MailError { .. } => ErrorCategory::Infrastructure,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::NotFound | ErrorCategory::Conflict => {
                ErrorSeverity::High
            }
            ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::Infrastructure => match self {
                // 暫時性錯誤，可重試
                AppError::DatabaseError(sqlx::Error::PoolTimedOut)
                | AppError::DatabaseError(sqlx::Error::Io(_))
                | AppError::MailError { .. } => ErrorSeverity::Medium,
                _ => ErrorSeverity::Critical,
            },
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        self.severity() == ErrorSeverity::Medium
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AppError::MalformedRow { .. } => {
                "Fix the reported line or re-run with --skip-invalid to import the valid rows"
            }
            AppError::InvalidPath { .. } => {
                "Pass a file name relative to the configured import directory"
            }
            AppError::EmptyOrder => "Add at least one line item to the order",
            AppError::UnknownPaymentType(_) => "Use one of the payment types: CreditCard, PayPal",
            AppError::InvalidEmail(_) => "Provide an email address containing '@'",
            AppError::UnknownSku(_) => "Register the SKU with the `stock` command first",
            AppError::InsufficientStock { .. } => "Restock the item or reduce the ordered quantity",
            AppError::DuplicateUser(_) => "Choose a different username",
            AppError::DuplicateOrder(_) => "Orders are processed once; use a new order id",
            AppError::DatabaseError(_) | AppError::MigrationError(_) => {
                "Check that the database is reachable and database.url is correct"
            }
            AppError::MailError { .. } => "Check the mail settings and retry",
            AppError::IoError(_) => "Check that the file exists and is readable",
            AppError::CsvError(_) => "Check that the file is comma-separated UTF-8 text",
            AppError::SerializationError(_) => "Check that the input is valid JSON",
            AppError::ConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. } => "Review the configuration file",
            AppError::ValidationError { .. } => "Correct the input and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Infrastructure => {
                format!("A system error occurred: {}", self)
            }
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_high_severity() {
        let err = AppError::MalformedRow {
            line: 3,
            found: 2,
            expected: 5,
        };
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.category(), ErrorCategory::Infrastructure);
        assert!(err.is_transient());
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = AppError::MissingConfigError {
            field: "database.url".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
    }

    #[test]
    fn test_failed_commands_never_exit_zero() {
        let errors = [
            AppError::EmptyOrder,
            AppError::from(sqlx::Error::PoolTimedOut),
            AppError::config("broken"),
        ];
        let codes: Vec<i32> = errors.iter().map(|e| e.severity().exit_code()).collect();
        assert_eq!(codes, vec![1, 2, 3]);
    }

    #[test]
    fn test_source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "report.csv");
        let err = AppError::from(io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
