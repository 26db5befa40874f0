//! Session/Account Resolver.
//!
//! One trust model is applied to every request, chosen by `config.auth_mode`:
//! - `Session`: the credential is an opaque token looked up server-side.
//! - `IdToken`: the credential is a provider ID token, re-verified on every call.
//!
//! The credential may arrive as `Authorization: Bearer <token>` or as the mode's
//! cookie. Accounts are never created here; only the OAuth callback does that.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use crate::auth::cookies::{ID_TOKEN_COOKIE, SESSION_COOKIE};
use crate::auth::identity::{IdentityError, IdentityProvider};
use crate::config::AuthMode;
use crate::errors::AppError;
use crate::models::account::Account;
use crate::state::AppState;

/// The account behind the request's credential.
pub struct CurrentAccount(pub Account);

/// The raw credential, without resolving it. Used by logout.
pub struct Credential(pub Option<String>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = presented_credential(&parts.headers, cookie_name(state.config.auth_mode))
            .ok_or(AppError::Unauthenticated)?;
        let account = resolve_account(state, &credential).await?;
        Ok(CurrentAccount(account))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Credential {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Credential(presented_credential(
            &parts.headers,
            cookie_name(state.config.auth_mode),
        )))
    }
}

pub fn cookie_name(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::Session => SESSION_COOKIE,
        AuthMode::IdToken => ID_TOKEN_COOKIE,
    }
}

/// Bearer header first, then the cookie. Empty values count as absent.
pub fn presented_credential(headers: &HeaderMap, cookie: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn resolve_account(state: &AppState, credential: &str) -> Result<Account, AppError> {
    match state.config.auth_mode {
        AuthMode::Session => {
            let account_id = state
                .logins
                .resolve(credential)
                .await?
                .ok_or(AppError::Unauthenticated)?;
            debug!("Session resolved to account {account_id}");
            state
                .accounts
                .find_by_id(account_id)
                .await?
                .ok_or(AppError::AccountNotFound)
        }
        AuthMode::IdToken => {
            let email = verify_id_token(
                state.identity.as_ref(),
                &state.config.oauth.client_id,
                credential,
            )
            .await?;
            state
                .accounts
                .find_by_email(&email)
                .await?
                .ok_or(AppError::AccountNotFound)
        }
    }
}

/// Introspects an ID token and returns its verified email.
///
/// Provider rejection → `Unauthenticated`; accepted but without a verified email
/// or issued to another client → `InvalidCredential`; provider unreachable or
/// misbehaving → `IdentityProvider`.
pub async fn verify_id_token(
    identity: &dyn IdentityProvider,
    client_id: &str,
    id_token: &str,
) -> Result<String, AppError> {
    let claims = match identity.introspect_id_token(id_token).await {
        Ok(claims) => claims,
        Err(IdentityError::Rejected { status, message }) if status < 500 => {
            debug!("ID token rejected by provider: {message}");
            return Err(AppError::Unauthenticated);
        }
        Err(e) => return Err(AppError::IdentityProvider(e.to_string())),
    };

    if let Some(aud) = claims.audience.as_deref() {
        if aud != client_id {
            warn!("ID token issued for a different client was presented");
            return Err(AppError::InvalidCredential(
                "token was not issued for this application".to_string(),
            ));
        }
    }

    claims
        .verified_email
        .ok_or_else(|| AppError::InvalidCredential("token carries no verified email".to_string()))
}
