//! Public account endpoints: signup, login, and the password-reset pair.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use tracing::instrument;

use shared::models::{
    AuthResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
    ResetPasswordRequest, ResetPasswordResponse, SignupRequest,
};

use crate::{app_state::AppState, http::error::AppResult};

pub fn routes() -> Router {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
}

#[instrument(skip(app_state, payload))]
async fn signup(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    let response = app_state
        .users
        .signup(&payload.username, &payload.email, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(app_state, payload))]
async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = app_state
        .users
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(response))
}

#[instrument(skip(app_state, payload))]
async fn forgot_password(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ForgotPasswordResponse>> {
    app_state.users.forgot_password(&payload.email).await?;
    Ok(Json(ForgotPasswordResponse {
        message: "Reset link sent to your email".to_string(),
    }))
}

#[instrument(skip(app_state, payload))]
async fn reset_password(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<ResetPasswordResponse>> {
    app_state
        .users
        .reset_password(&payload.token, &payload.password)
        .await?;
    Ok(Json(ResetPasswordResponse {
        message: "Password updated successfully".to_string(),
    }))
}
