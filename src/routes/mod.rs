pub mod auth;
pub mod comments;
pub mod likes;
pub mod posts;
pub mod profiles;
pub mod replies;
pub mod users;

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;

use crate::blob::ImageUpload;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::state::AppState;

/// Every API route, mounted under `/api/v1` by the caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(profiles::router())
        .merge(posts::router())
        .merge(likes::router())
        .merge(comments::router())
        .merge(replies::router())
}

/// Success envelope: `{"status": <code>, "response": <payload>}`.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    payload: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            status: StatusCode::OK,
            payload,
        }
    }

    pub fn created(payload: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            payload,
        }
    }
}

#[derive(Serialize)]
struct Envelope<T> {
    status: u16,
    response: T,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            status: self.status.as_u16(),
            response: self.payload,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Pull the `file` part out of an upload form.
pub(crate) async fn read_image(mut multipart: Multipart) -> AppResult<ImageUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
        return Ok(ImageUpload {
            bytes,
            file_name,
            content_type,
        });
    }
    Err(AppError::Validation(FieldErrors::single(
        "Invalid_file",
        "Invalid File",
    )))
}
