use axum::{extract::State, Json};
use tracing::info;

use crate::auth::extractors::CurrentAccount;
use crate::cv::models::{Cv, CvPayload};
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

/// GET /cv/me
pub async fn handle_get_cv(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> Result<Json<Cv>, AppError> {
    let cv = state
        .cvs
        .find_for_account(account.id)
        .await?
        .ok_or_else(|| AppError::NotFound("CV not found".to_string()))?;
    Ok(Json(cv))
}

/// POST /cv/
///
/// Create-or-replace: every field of an existing CV is overwritten; list
/// sections are replaced wholesale, never merged.
pub async fn handle_upsert_cv(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    AppJson(payload): AppJson<CvPayload>,
) -> Result<Json<Cv>, AppError> {
    payload.validate()?;
    let cv = state.cvs.upsert(account.id, &payload).await?;
    info!("CV {} saved for account {}", cv.id, account.id);
    Ok(Json(cv))
}
