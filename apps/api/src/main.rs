mod accounts;
mod auth;
mod config;
mod cv;
mod db;
mod errors;
mod extract;
mod interview;
mod llm_client;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::accounts::repo::PgAccountRepository;
use crate::auth::identity::GoogleIdentityClient;
use crate::auth::sessions::{LoginSessionRepository, PgLoginSessionRepository};
use crate::config::Config;
use crate::cv::repo::PgCvRepository;
use crate::db::create_pool;
use crate::interview::sessions::InterviewSessions;
use crate::llm_client::{GeminiClient, GenerationParams, LlmGateway};
use crate::routes::build_router;
use crate::state::AppState;

const INTERVIEW_SWEEP_EVERY: Duration = Duration::from_secs(60);
const LOGIN_PURGE_EVERY: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HireMind API v{}", env!("CARGO_PKG_VERSION"));
    info!("Auth mode: {:?}", config.auth_mode);

    // PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    let logins = Arc::new(PgLoginSessionRepository::new(db.clone()));
    spawn_login_purge(logins.clone());

    // Identity provider
    let identity = GoogleIdentityClient::new(config.oauth.clone())?;

    // LLM client
    let gemini = GeminiClient::new(&config.llm)?;
    info!("LLM client initialized (model: {})", gemini.model());
    let llm = LlmGateway::new(
        Arc::new(gemini),
        GenerationParams {
            temperature: config.llm.temperature,
            top_p: config.llm.top_p,
        },
    );

    // In-memory interview sessions
    let interviews = InterviewSessions::new(Duration::from_secs(config.interview_session_ttl_secs));
    let _sweeper = interviews.spawn_eviction(INTERVIEW_SWEEP_EVERY);

    let state = AppState {
        accounts: Arc::new(PgAccountRepository::new(db.clone())),
        cvs: Arc::new(PgCvRepository::new(db)),
        logins,
        identity: Arc::new(identity),
        llm,
        interviews,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_allowed_origins)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Credentialed CORS for the configured front-end origins only.
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

fn spawn_login_purge(logins: Arc<PgLoginSessionRepository>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(LOGIN_PURGE_EVERY);
        loop {
            ticker.tick().await;
            match logins.purge_expired().await {
                Ok(0) => {}
                Ok(n) => info!("Purged {n} expired login sessions"),
                Err(e) => warn!("Login session purge failed: {e}"),
            }
        }
    });
}
