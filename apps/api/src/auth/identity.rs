//! Identity Verification Client: the only module that talks to Google's OAuth endpoints.
//!
//! Every upstream failure (unreachable, timeout, non-2xx, unexpected body) is
//! converted into `IdentityError` here; callers never see a raw reqwest error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::OAuthConfig;
use crate::errors::AppError;

pub const OAUTH_SCOPES: &str = "openid email profile";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("token response did not include an access_token")]
    MissingAccessToken,
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        AppError::IdentityProvider(err.to_string())
    }
}

/// Tokens returned by the authorization-code exchange.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub id_token: Option<String>,
}

/// Profile fetched with an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Outcome of introspecting an ID token the provider accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Present only when the provider vouches for it.
    pub verified_email: Option<String>,
    pub audience: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the user-agent is redirected to in order to start the login.
    fn authorization_url(&self, state: &str) -> String;

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, IdentityError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<IdentityProfile, IdentityError>;

    async fn introspect_id_token(&self, id_token: &str) -> Result<TokenClaims, IdentityError>;
}

#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
    pub tokeninfo: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token: "https://oauth2.googleapis.com/token".to_string(),
            userinfo: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            tokeninfo: "https://oauth2.googleapis.com/tokeninfo".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: Option<String>,
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    email: Option<String>,
    // tokeninfo encodes booleans as strings
    email_verified: Option<String>,
    aud: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Clone)]
pub struct GoogleIdentityClient {
    client: Client,
    config: OAuthConfig,
    endpoints: GoogleEndpoints,
}

impl GoogleIdentityClient {
    pub fn new(config: OAuthConfig) -> Result<Self, IdentityError> {
        Self::with_endpoints(config, GoogleEndpoints::default())
    }

    pub fn with_endpoints(
        config: OAuthConfig,
        endpoints: GoogleEndpoints,
    ) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            endpoints,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityClient {
    fn authorization_url(&self, state: &str) -> String {
        build_authorization_url(&self.endpoints.authorize, &self.config, state)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, IdentityError> {
        let form = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(&self.endpoints.token)
            .form(&form)
            .send()
            .await?;
        let body: GoogleTokenResponse = read_json(response).await?;

        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(IdentityError::MissingAccessToken)?;

        debug!(
            "OAuth code exchanged (id_token present: {})",
            body.id_token.is_some()
        );

        Ok(TokenGrant {
            access_token,
            id_token: body.id_token,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<IdentityProfile, IdentityError> {
        let response = self
            .client
            .get(&self.endpoints.userinfo)
            .bearer_auth(access_token)
            .send()
            .await?;
        let info: GoogleUserInfo = read_json(response).await?;

        Ok(IdentityProfile {
            subject: info.id,
            email: info.email,
            name: info.name,
        })
    }

    async fn introspect_id_token(&self, id_token: &str) -> Result<TokenClaims, IdentityError> {
        let response = self
            .client
            .get(&self.endpoints.tokeninfo)
            .query(&[("id_token", id_token)])
            .send()
            .await?;
        let info: GoogleTokenInfo = read_json(response).await?;

        let verified = info.email_verified.as_deref() != Some("false");
        Ok(TokenClaims {
            verified_email: info.email.filter(|_| verified),
            audience: info.aud,
        })
    }
}

fn build_authorization_url(base: &str, config: &OAuthConfig, state: &str) -> String {
    let params = [
        ("response_type", "code"),
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("scope", OAUTH_SCOPES),
        ("state", state),
    ];
    match Url::parse_with_params(base, &params) {
        Ok(url) => url.to_string(),
        // The base is a constant or operator-supplied URL; fall back to it verbatim.
        Err(_) => base.to_string(),
    }
}

/// Decodes a provider response, turning non-2xx statuses into `Rejected`.
async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, IdentityError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<GoogleErrorBody>(&body)
            .ok()
            .and_then(|e| e.error_description.or(e.error))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        if status != StatusCode::BAD_REQUEST && status != StatusCode::UNAUTHORIZED {
            warn!("Identity provider returned {status}: {message}");
        }
        return Err(IdentityError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| IdentityError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth_config() -> OAuthConfig {
        OAuthConfig {
            client_id: "client-123.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:8080/auth/callback".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_authorization_url_carries_client_scopes_and_state() {
        let url = build_authorization_url(
            "https://accounts.google.com/o/oauth2/v2/auth",
            &oauth_config(),
            "xyz",
        );
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&(
            "client_id".into(),
            "client-123.apps.googleusercontent.com".into()
        )));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:8080/auth/callback".into()
        )));
        assert!(pairs.contains(&("scope".into(), "openid email profile".into())));
        assert!(pairs.contains(&("state".into(), "xyz".into())));
    }

    #[test]
    fn test_token_response_without_access_token_deserializes() {
        let body: GoogleTokenResponse =
            serde_json::from_str(r#"{"error": "invalid_grant"}"#).unwrap();
        assert!(body.access_token.is_none());
        assert!(body.id_token.is_none());
    }

    #[test]
    fn test_tokeninfo_string_booleans() {
        let info: GoogleTokenInfo = serde_json::from_str(
            r#"{"email": "a@b.com", "email_verified": "true", "aud": "client"}"#,
        )
        .unwrap();
        assert_eq!(info.email_verified.as_deref(), Some("true"));
        assert_eq!(info.aud.as_deref(), Some("client"));
    }
}
