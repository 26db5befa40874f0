use std::collections::HashMap;

use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extract::{optional_json, AppJson, AppQuery};
use crate::interview::flow::{self, StartedInterview};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskQuery {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartInterviewRequest {
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub session_id: String,
    /// Question text → answer text.
    #[serde(default)]
    pub answers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnswersResponse {
    pub evaluation: String,
    pub score: Option<u8>,
}

/// GET /ai/ask?prompt=...
///
/// Raw proxy to the language model.
pub async fn handle_ask(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AskQuery>,
) -> Result<Json<AskResponse>, AppError> {
    if query.prompt.trim().is_empty() {
        return Err(AppError::InvalidInput("prompt cannot be empty".to_string()));
    }
    let response = state.llm.ask(&query.prompt).await?;
    Ok(Json(AskResponse { response }))
}

/// POST /ai/start_interview
///
/// An empty body or a missing topic selects the default topic. A non-empty
/// body must be valid JSON.
pub async fn handle_start_interview(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StartedInterview>, AppError> {
    let request: StartInterviewRequest = optional_json(&body)?.unwrap_or_default();
    let started =
        flow::start_interview(&state.llm, &state.interviews, request.topic.as_deref()).await?;
    Ok(Json(started))
}

/// POST /ai/submit_answers
pub async fn handle_submit_answers(
    State(state): State<AppState>,
    AppJson(request): AppJson<SubmitAnswersRequest>,
) -> Result<Json<SubmitAnswersResponse>, AppError> {
    let evaluation = flow::submit_answers(
        &state.llm,
        &state.interviews,
        &request.session_id,
        &request.answers,
    )
    .await?;

    Ok(Json(SubmitAnswersResponse {
        evaluation: evaluation.text,
        score: evaluation.score,
    }))
}
