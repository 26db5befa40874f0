use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// How authenticated requests are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// The OAuth callback mints an opaque token stored server-side. Requests
    /// presenting it are trusted until it expires or is revoked; the identity
    /// provider is not consulted again.
    Session,
    /// The provider's ID token is the credential and is re-verified against
    /// the provider on every request. Slower, but revocation is immediate.
    IdToken,
}

impl FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(AuthMode::Session),
            "id_token" => Ok(AuthMode::IdToken),
            other => bail!("AUTH_MODE must be 'session' or 'id_token', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
}

/// Application configuration loaded from environment variables.
/// Startup aborts if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub oauth: OAuthConfig,
    pub llm: LlmConfig,
    pub auth_mode: AuthMode,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub post_login_redirect: String,
    pub interview_session_ttl_secs: u64,
    pub cors_allowed_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let temperature: f32 = env_or("LLM_TEMPERATURE", 0.7)?;
        let top_p: f32 = env_or("LLM_TOP_P", 0.95)?;
        ensure_unit_interval("LLM_TEMPERATURE", temperature)?;
        ensure_unit_interval("LLM_TOP_P", top_p)?;
        let session_ttl_hours: i64 = env_or("SESSION_TTL_HOURS", 168)?;
        ensure_session_ttl(session_ttl_hours)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            oauth: OAuthConfig {
                client_id: require_env("GOOGLE_CLIENT_ID")?,
                client_secret: require_env("GOOGLE_CLIENT_SECRET")?,
                redirect_uri: require_env("OAUTH_REDIRECT_URI")?,
                timeout_secs: env_or("IDENTITY_TIMEOUT_SECS", 10)?,
            },
            llm: LlmConfig {
                api_key: require_env("GEMINI_API_KEY")?,
                model: std::env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| "gemini-2.0-flash-001".to_string()),
                base_url: std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| {
                    "https://generativelanguage.googleapis.com/v1beta".to_string()
                }),
                temperature,
                top_p,
                timeout_secs: env_or("LLM_TIMEOUT_SECS", 30)?,
            },
            auth_mode: env_or("AUTH_MODE", AuthMode::Session)?,
            session_ttl_hours,
            cookie_secure: env_or("COOKIE_SECURE", true)?,
            post_login_redirect: std::env::var("POST_LOGIN_REDIRECT")
                .unwrap_or_else(|_| "/profile".to_string()),
            interview_session_ttl_secs: env_or("INTERVIEW_SESSION_TTL_SECS", 3600)?,
            cors_allowed_origins: parse_origins(
                &std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            ),
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads and parses an optional variable, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}

/// Upper bound on `SESSION_TTL_HOURS`: one year.
const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

fn ensure_session_ttl(hours: i64) -> Result<()> {
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        bail!("SESSION_TTL_HOURS must be within [1, {MAX_SESSION_TTL_HOURS}], got {hours}");
    }
    Ok(())
}

fn ensure_unit_interval(key: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        bail!("{key} must be within [0, 1], got {value}");
    }
    Ok(())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
