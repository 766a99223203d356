use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{instrument, warn};

use crate::{
    accounts::{
        dto::{AccountView, LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
        services::{self, is_valid_email},
    },
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/register", post(register))
        .route("/accounts/login", post(login))
        .route("/accounts", get(list_accounts))
        .route("/accounts/:id", get(get_account).delete(delete_account))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountView>), Response> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(reject(StatusCode::BAD_REQUEST, "Invalid email"));
    }

    let account = services::register(
        &state.store,
        &payload.username,
        &payload.email,
        &payload.password,
    )
    .await
    .map_err(IntoResponse::into_response)?;

    Ok((StatusCode::CREATED, Json(AccountView::from(account))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, Response> {
    let account = services::login(&state.store, &payload.username, &payload.password)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user: AccountView::from(account),
    }))
}

#[instrument(skip(state))]
pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountView>>, Response> {
    let accounts = services::list_accounts(&state.store)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(accounts.into_iter().map(AccountView::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AccountView>, Response> {
    let account = services::get_account(&state.store, id)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(AccountView::from(account)))
}

#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, Response> {
    services::delete_account(&state.store, id)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(MessageResponse {
        message: format!("Account {id} deleted successfully"),
    }))
}

fn reject(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}
