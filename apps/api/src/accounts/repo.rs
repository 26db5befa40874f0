use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::account::Account;

/// A verified identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub google_id: Option<String>,
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    async fn create(&self, name: &str) -> Result<Account, AppError>;

    /// Returns the account owning `identity.google_id` (its email is refreshed
    /// when free) or else `identity.email`, creating one if neither exists.
    /// The boolean is true when a new account was created.
    async fn find_or_create(&self, identity: &NewIdentity) -> Result<(Account, bool), AppError>;

    async fn update_name(&self, id: Uuid, name: &str) -> Result<Account, AppError>;

    /// Deletes the account and everything it owns.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<Account>, AppError> {
        Ok(
            sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE google_id = $1")
                .bind(google_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Moves the account to the provider's current email unless another
    /// account already owns it.
    async fn refresh_email(&self, account: Account, email: &str) -> Result<Account, AppError> {
        if account.email.as_deref() == Some(email) {
            return Ok(account);
        }
        let updated = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET email = $2
            WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM accounts WHERE email = $2)
            RETURNING *
            "#,
        )
        .bind(account.id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated.unwrap_or(account))
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(
            sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(
            sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create(&self, name: &str) -> Result<Account, AppError> {
        Ok(sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_or_create(&self, identity: &NewIdentity) -> Result<(Account, bool), AppError> {
        // A known provider subject wins over the email, which the provider may change.
        if let Some(google_id) = &identity.google_id {
            if let Some(account) = self.find_by_google_id(google_id).await? {
                let account = self.refresh_email(account, &identity.email).await?;
                return Ok((account, false));
            }
        }

        // Bare ON CONFLICT covers both unique keys, so concurrent first logins
        // cannot race into a duplicate or a constraint error.
        let inserted = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, name, email, google_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.google_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(account) = inserted {
            return Ok((account, true));
        }

        if let Some(google_id) = &identity.google_id {
            if let Some(account) = self.find_by_google_id(google_id).await? {
                return Ok((account, false));
            }
        }
        let existing = self
            .find_by_email(&identity.email)
            .await?
            .ok_or(AppError::AccountNotFound)?;
        Ok((existing, false))
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>("UPDATE accounts SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::AccountNotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        // cvs and login_sessions cascade via their foreign keys
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::AccountNotFound);
        }
        Ok(())
    }
}
