use std::sync::Arc;

use crate::accounts::repo::AccountRepository;
use crate::auth::identity::IdentityProvider;
use crate::auth::sessions::LoginSessionRepository;
use crate::config::Config;
use crate::cv::repo::CvRepository;
use crate::interview::sessions::InterviewSessions;
use crate::llm_client::LlmGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountRepository>,
    pub cvs: Arc<dyn CvRepository>,
    /// Opaque login tokens; only consulted when `config.auth_mode` is `Session`.
    pub logins: Arc<dyn LoginSessionRepository>,
    pub identity: Arc<dyn IdentityProvider>,
    pub llm: LlmGateway,
    /// Lives for the whole process; cloning shares the same map.
    pub interviews: InterviewSessions,
    pub config: Config,
}
