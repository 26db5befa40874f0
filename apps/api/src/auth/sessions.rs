use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::login_session::LoginSessionRow;

/// 43 alphanumeric characters from the OS RNG (~256 bits).
const TOKEN_LEN: usize = 43;

pub fn generate_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Server-side mapping from opaque login tokens to accounts.
#[async_trait]
pub trait LoginSessionRepository: Send + Sync {
    /// Mints a token for `account_id` valid for `ttl`.
    async fn create(&self, account_id: Uuid, ttl: Duration) -> Result<String, AppError>;

    /// Returns the owning account if the token exists and has not expired.
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AppError>;

    async fn revoke(&self, token: &str) -> Result<(), AppError>;

    /// Deletes expired rows, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct PgLoginSessionRepository {
    pool: PgPool,
}

impl PgLoginSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginSessionRepository for PgLoginSessionRepository {
    async fn create(&self, account_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let token = generate_token();
        sqlx::query(
            "INSERT INTO login_sessions (token, account_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(&token)
        .bind(account_id)
        .bind(Utc::now() + ttl)
        .execute(&self.pool)
        .await?;
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AppError> {
        let row = sqlx::query_as::<_, LoginSessionRow>(
            "SELECT * FROM login_sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.account_id))
    }

    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM login_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM login_sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
