//! OAuth authorization-code login, callback and logout.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::accounts::repo::NewIdentity;
use crate::auth::cookies::{
    credential_cookie, oauth_state_cookie, removal_cookie, ID_TOKEN_COOKIE, OAUTH_STATE_COOKIE,
    SESSION_COOKIE,
};
use crate::auth::extractors::Credential;
use crate::auth::sessions::generate_token;
use crate::config::AuthMode;
use crate::errors::AppError;
use crate::extract::AppQuery;
use crate::state::AppState;

/// Display name stored when the provider profile has none.
const FALLBACK_NAME: &str = "No name";

/// Google ID tokens expire an hour after issue.
pub const ID_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn found(location: &str) -> [(header::HeaderName, String); 1] {
    [(header::LOCATION, location.to_string())]
}

/// GET /auth/login
///
/// Redirects the user-agent to the provider's consent screen. A random `state`
/// is stored in a short-lived cookie and checked on the way back.
pub async fn handle_login(State(state): State<AppState>, jar: CookieJar) -> Response {
    let oauth_state = generate_token();
    let url = state.identity.authorization_url(&oauth_state);
    let jar = jar.add(oauth_state_cookie(oauth_state, state.config.cookie_secure));

    (StatusCode::FOUND, jar, found(&url)).into_response()
}

/// GET /auth/callback?code=...&state=...
///
/// Exchanges the code, fetches the profile, creates the account on first sight,
/// establishes the session, and redirects to the profile page.
pub async fn handle_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    AppQuery(query): AppQuery<CallbackQuery>,
) -> Result<Response, AppError> {
    if let Some(error) = query.error {
        info!("OAuth authorization was not granted: {error}");
        return Err(AppError::Unauthenticated);
    }

    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    match (expected_state.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(received)) if !expected.is_empty() && expected == received => {}
        _ => {
            warn!("OAuth callback with missing or mismatched state");
            return Err(AppError::InvalidInput(
                "OAuth state is missing or does not match".to_string(),
            ));
        }
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::InvalidInput("missing authorization code".to_string()))?;

    let grant = state.identity.exchange_code(&code).await?;
    let profile = state.identity.fetch_profile(&grant.access_token).await?;

    let email = profile
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::IdentityProvider("profile did not include an email".to_string()))?;

    let identity = NewIdentity {
        name: profile
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_NAME.to_string()),
        email,
        google_id: profile.subject,
    };
    let (account, created) = state.accounts.find_or_create(&identity).await?;
    if created {
        info!("Created account {} on first login", account.id);
    }

    let ttl_secs = state.config.session_ttl_hours * 3600;
    let secure = state.config.cookie_secure;
    let session_cookie = match state.config.auth_mode {
        AuthMode::Session => {
            let token = state
                .logins
                .create(account.id, chrono::Duration::hours(state.config.session_ttl_hours))
                .await?;
            credential_cookie(SESSION_COOKIE, token, ttl_secs, secure)
        }
        AuthMode::IdToken => {
            let id_token = grant.id_token.filter(|t| !t.is_empty()).ok_or_else(|| {
                AppError::IdentityProvider("token response did not include an id_token".to_string())
            })?;
            credential_cookie(
                ID_TOKEN_COOKIE,
                id_token,
                ttl_secs.min(ID_TOKEN_LIFETIME_SECS),
                secure,
            )
        }
    };

    info!("Account {} logged in", account.id);

    let jar = jar
        .remove(removal_cookie(OAUTH_STATE_COOKIE))
        .add(session_cookie);
    Ok((StatusCode::FOUND, jar, found(&state.config.post_login_redirect)).into_response())
}

/// POST /auth/logout
///
/// Revokes the server-side session (if any) and clears the session cookies.
pub async fn handle_logout(
    State(state): State<AppState>,
    jar: CookieJar,
    Credential(credential): Credential,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let (AuthMode::Session, Some(token)) = (state.config.auth_mode, credential.as_deref()) {
        state.logins.revoke(token).await?;
    }

    let jar = jar
        .remove(removal_cookie(SESSION_COOKIE))
        .remove(removal_cookie(ID_TOKEN_COOKIE));

    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}
