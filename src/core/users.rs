use crate::domain::model::{User, UserView};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{validate_email, validate_non_empty_string};
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<UserView>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user.map(UserView::from))
    }

    /// Inserts a new user. Input is validated before the database is touched.
    pub async fn create_user(&self, name: &str, email: &str) -> Result<UserView> {
        let name = name.trim();
        let email = email.trim();
        validate_non_empty_string("name", name)?;
        validate_email(email)?;

        let created_at = Utc::now();
        let result = sqlx::query("INSERT INTO users (username, email, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::DuplicateUser(name.to_string())
                }
                other => AppError::from(other),
            })?;

        let id = result.last_insert_rowid();
        tracing::info!("👤 Created user {} (id={})", name, id);

        Ok(UserView {
            id,
            username: name.to_string(),
            email: email.to_string(),
            created_at,
        })
    }

    pub async fn count_users(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
