use crate::config::DatabaseConfig;
use crate::utils::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Opens the connection pool and brings the schema up to date.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(options)
        .await?;

    tracing::debug!(
        "Database pool ready (max_connections={})",
        config.max_connections
    );

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::debug!("Database migrations applied");

    Ok(pool)
}
