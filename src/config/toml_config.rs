use crate::domain::model::ImportMode;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub import: ImportConfig,
    pub server: ServerConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://backoffice.db?mode=rwc".to_string(),
            max_connections: 5,
            acquire_timeout_seconds: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            // 每個 in-memory 連線都是獨立資料庫
            max_connections: 1,
            acquire_timeout_seconds: 5,
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub base_dir: PathBuf,
    pub min_fields: usize,
    pub mode: ImportMode,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./imports"),
            min_fields: 5,
            mode: ImportMode::Abort,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub from_address: String,
    pub confirmation_subject: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: "orders@localhost".to_string(),
            confirmation_subject: "Order Confirmed".to_string(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| AppError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${DATABASE_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| AppError::config(format!("invalid substitution pattern: {}", e)))?;

        let mut missing = Vec::new();
        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                missing.push(var_name.to_string());
                String::new()
            })
        });

        if let Some(field) = missing.into_iter().next() {
            return Err(AppError::MissingConfigError {
                field: format!("environment variable {}", field),
            });
        }

        Ok(result.into_owned())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_database_url("database.url", &self.database.url)?;
        validation::validate_positive_number(
            "database.max_connections",
            self.database.max_connections as usize,
            1,
        )?;

        let base_dir = self.import.base_dir.to_string_lossy();
        validation::validate_path("import.base_dir", &base_dir)?;
        validation::validate_positive_number("import.min_fields", self.import.min_fields, 1)?;

        validation::validate_host_port("server.bind", &self.server.bind)?;

        validation::validate_email(&self.mail.from_address).map_err(|_| {
            AppError::InvalidConfigValueError {
                field: "mail.from_address".to_string(),
                value: self.mail.from_address.clone(),
                reason: "not an email address".to_string(),
            }
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.import.min_fields, 5);
        assert_eq!(config.import.mode, ImportMode::Abort);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [import]
            base_dir = "/srv/imports"
            mode = "skip"
            "#,
        )
        .unwrap();

        assert_eq!(config.import.base_dir, PathBuf::from("/srv/imports"));
        assert_eq!(config.import.mode, ImportMode::Skip);
        assert_eq!(config.import.min_fields, 5);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("SMALL_BACKOFFICE_TEST_DB", "sqlite://from-env.db");
        let config = AppConfig::from_toml_str(
            r#"
            [database]
            url = "${SMALL_BACKOFFICE_TEST_DB}"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.url, "sqlite://from-env.db");
    }

    #[test]
    fn test_missing_env_var_is_reported() {
        let err = AppConfig::from_toml_str(
            r#"
            [database]
            url = "${SMALL_BACKOFFICE_TEST_UNSET_VAR}"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::MissingConfigError { .. }));
    }

    #[test]
    fn test_hostname_bind_address_is_accepted() {
        let mut config = AppConfig::default();
        config.server.bind = "localhost:8080".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_bind_address() {
        let mut config = AppConfig::default();
        config.server.bind = "localhost".to_string();
        assert!(config.validate().is_err());
    }
}
