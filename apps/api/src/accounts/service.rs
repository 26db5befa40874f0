//! Account Service operations. Each takes an account already resolved by
//! `auth::extractors::CurrentAccount`.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::accounts::repo::AccountRepository;
use crate::errors::AppError;
use crate::models::account::Account;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

impl From<&Account> for Profile {
    fn from(account: &Account) -> Self {
        Profile {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
        }
    }
}

pub fn get_profile(account: &Account) -> Profile {
    Profile::from(account)
}

fn validated_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name cannot be empty".to_string()));
    }
    Ok(name)
}

pub async fn update_profile(
    accounts: &dyn AccountRepository,
    account: &Account,
    new_name: &str,
) -> Result<Account, AppError> {
    let name = validated_name(new_name)?;
    let updated = accounts.update_name(account.id, name).await?;
    info!("Account {} renamed", updated.id);
    Ok(updated)
}

/// Deletes the account together with its CV and login sessions.
pub async fn delete_account(
    accounts: &dyn AccountRepository,
    account: &Account,
) -> Result<(), AppError> {
    accounts.delete(account.id).await?;
    info!("Account {} deleted", account.id);
    Ok(())
}

/// Name-only creation; the account has no email or external identity yet.
pub async fn create_account(
    accounts: &dyn AccountRepository,
    name: &str,
) -> Result<Account, AppError> {
    let name = validated_name(name)?;
    let account = accounts.create(name).await?;
    info!("Account {} created by name", account.id);
    Ok(account)
}
