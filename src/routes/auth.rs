use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::Serialize;

use crate::auth::reset::{self, ForgotRequest, ResetRequest};
use crate::auth::{password, session};
use crate::error::{AppError, AppResult};
use crate::extractors::{ApiJson, CurrentUser};
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::store::users::{self, Credentials};
use crate::store::Input;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: i64,
    pub email: String,
    pub username: String,
    pub avatar_path: Option<String>,
    pub profile_id: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/password/forgot", post(forgot_password))
        .route("/password/reset", post(reset_password))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let credentials = credentials.prepare()?;

    let conn = state.db.get()?;
    let user = users::find_by_email(&conn, &credentials.email)?
        .filter(|user| password::verify(&user.password_hash, &credentials.password))
        .ok_or(AppError::InvalidCredentials)?;

    let token = session::create(&conn, user.id, state.config.auth.session_hours)?;
    tracing::info!("User {} logged in", user.id);

    Ok(ApiResponse::ok(LoginResponse {
        token,
        id: user.id,
        email: user.email,
        username: user.username,
        avatar_path: user.avatar_path,
        profile_id: user.profile_id,
    }))
}

async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<&'static str>> {
    let conn = state.db.get()?;
    session::delete(&conn, &user.token)?;
    Ok(ApiResponse::ok("Logged out"))
}

async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ForgotRequest>,
) -> AppResult<ApiResponse<&'static str>> {
    let request = request.prepare()?;

    let issued = {
        let conn = state.db.get()?;
        reset::request_reset(&conn, &request)?
    };
    state
        .mailer
        .send_reset_email(&issued.email, &issued.token)
        .await?;

    Ok(ApiResponse::ok("Reset link sent"))
}

async fn reset_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetRequest>,
) -> AppResult<ApiResponse<&'static str>> {
    let request = request.prepare()?;

    let conn = state.db.get()?;
    reset::reset_password(&conn, &request)?;
    Ok(ApiResponse::ok("Success"))
}
