pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::accounts::handlers as accounts;
use crate::auth::handlers as auth;
use crate::cv::handlers as cv;
use crate::interview::handlers as interview;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // OAuth handshake
        .route("/auth/login", get(auth::handle_login))
        .route("/auth/callback", get(auth::handle_callback))
        .route("/auth/logout", post(auth::handle_logout))
        // Account Service
        .route("/account/", post(accounts::handle_create))
        .route("/account/me", get(accounts::handle_me))
        .route("/account/update", put(accounts::handle_update))
        .route("/account/delete", delete(accounts::handle_delete))
        // CV Store
        .route("/cv/me", get(cv::handle_get_cv))
        .route("/cv/", post(cv::handle_upsert_cv))
        .route("/cv", post(cv::handle_upsert_cv))
        // LLM proxy and interview flow
        .route("/ai/ask", get(interview::handle_ask))
        .route("/ai/start_interview", post(interview::handle_start_interview))
        .route("/ai/submit_answers", post(interview::handle_submit_answers))
        .with_state(state)
}
