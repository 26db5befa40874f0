use axum::{body::Bytes, extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::accounts::service::{self, Profile};
use crate::auth::cookies::{removal_cookie, ID_TOKEN_COOKIE, SESSION_COOKIE};
use crate::auth::extractors::CurrentAccount;
use crate::errors::AppError;
use crate::extract::{optional_json, AppJson, AppQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NameParams {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub message: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// GET /account/me
pub async fn handle_me(CurrentAccount(account): CurrentAccount) -> Json<Profile> {
    Json(service::get_profile(&account))
}

/// PUT /account/update?name=...
///
/// The name may also be sent as a JSON body `{"name": "..."}`; the query wins.
pub async fn handle_update(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    AppQuery(params): AppQuery<NameParams>,
    body: Bytes,
) -> Result<Json<UpdateResponse>, AppError> {
    let body: Option<NameParams> = optional_json(&body)?;
    let name = params
        .name
        .or_else(|| body.and_then(|b| b.name))
        .ok_or_else(|| AppError::InvalidInput("name is required".to_string()))?;

    let updated = service::update_profile(state.accounts.as_ref(), &account, &name).await?;

    Ok(Json(UpdateResponse {
        message: "Profile updated".to_string(),
        name: updated.name,
    }))
}

/// DELETE /account/delete
pub async fn handle_delete(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    jar: CookieJar,
) -> Result<(CookieJar, Json<DeleteResponse>), AppError> {
    service::delete_account(state.accounts.as_ref(), &account).await?;

    let jar = jar
        .remove(removal_cookie(SESSION_COOKIE))
        .remove(removal_cookie(ID_TOKEN_COOKIE));

    Ok((
        jar,
        Json(DeleteResponse {
            message: "Account deleted".to_string(),
        }),
    ))
}

/// POST /account/
pub async fn handle_create(
    State(state): State<AppState>,
    AppJson(body): AppJson<NameParams>,
) -> Result<Json<Profile>, AppError> {
    let name = body.name.unwrap_or_default();
    let account = service::create_account(state.accounts.as_ref(), &name).await?;
    Ok(Json(Profile::from(&account)))
}
