use std::collections::BTreeMap;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::reactions::ReactionKind;

/// Per-request accumulator of `{wire key: message}` validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(key: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(key, message);
        errors
    }

    pub fn add(&mut self, key: &str, message: &str) {
        self.0.insert(key.to_string(), message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "{}", keys.join(", "))
    }
}

/// Entity kinds that can be missing; each has its own wire key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Profile,
    Post,
    Comment,
    Reply,
    Reaction,
}

impl Resource {
    fn wire(self) -> (&'static str, &'static str) {
        match self {
            Resource::User => ("No_user", "No User Found"),
            Resource::Profile => ("No_profile", "No Profile Found"),
            Resource::Post => ("No_post", "No Post Found"),
            Resource::Comment => ("No_comment", "No Comment Found"),
            Resource::Reply => ("No_reply", "No Reply Found"),
            Resource::Reaction => ("No_like", "No Like Found"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire().1)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(Resource),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Duplicate reaction: already {0}d")]
    DuplicateReaction(ReactionKind),

    #[error("Reaction not found")]
    ReactionNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidCredentials => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::ReactionNotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::DuplicateReaction(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The `error` map sent to clients. Storage details stay in the log.
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            AppError::Validation(errors) => errors.clone(),
            AppError::InvalidRequest(_) => FieldErrors::single("Invalid_request", "Invalid Request"),
            AppError::NotFound(resource) => {
                let (key, message) = resource.wire();
                FieldErrors::single(key, message)
            }
            AppError::Unauthorized => FieldErrors::single("Unauthorized", "Unauthorized"),
            AppError::DuplicateReaction(ReactionKind::Like) => {
                FieldErrors::single("Double_like", "You have already liked this post")
            }
            AppError::DuplicateReaction(ReactionKind::Dislike) => {
                FieldErrors::single("Double_dislike", "You have already disliked this post")
            }
            AppError::ReactionNotFound => Resource::Reaction.wire_errors(),
            AppError::InvalidCredentials => {
                FieldErrors::single("Incorrect_details", "Incorrect Details")
            }
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => {
                FieldErrors::single("Other_error", "Please try again later")
            }
        }
    }
}

impl Resource {
    fn wire_errors(self) -> FieldErrors {
        let (key, message) = self.wire();
        FieldErrors::single(key, message)
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    status: u16,
    error: FieldErrors,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {}", e),
            AppError::Pool(e) => tracing::error!("Pool error: {}", e),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::InvalidRequest(msg) => tracing::debug!("Rejected request: {}", msg),
            _ => {}
        }

        let status = self.status();
        let body = ErrorEnvelope {
            status: status.as_u16(),
            error: self.field_errors(),
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn response_status(err: AppError) -> StatusCode {
        let response = err.into_response();
        response.status()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(
            response_status(AppError::NotFound(Resource::Post)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            response_status(AppError::ReactionNotFound),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unauthorized_returns_401() {
        assert_eq!(
            response_status(AppError::Unauthorized),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn invalid_request_returns_400() {
        assert_eq!(
            response_status(AppError::InvalidRequest("bad id".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn validation_returns_422() {
        let errors = FieldErrors::single("Required_body", "required comment");
        assert_eq!(
            response_status(AppError::Validation(errors)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn duplicate_reaction_returns_409() {
        assert_eq!(
            response_status(AppError::DuplicateReaction(ReactionKind::Like)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_returns_500() {
        assert_eq!(
            response_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn storage_errors_do_not_leak_details() {
        let err = AppError::Database(rusqlite::Error::InvalidQuery);
        let errors = err.field_errors();
        assert_eq!(errors.get("Other_error"), Some("Please try again later"));
        assert!(!errors.to_string().contains("InvalidQuery"));
    }

    #[test]
    fn not_found_uses_resource_keys() {
        let errors = AppError::NotFound(Resource::Post).field_errors();
        assert_eq!(errors.get("No_post"), Some("No Post Found"));
        let errors = AppError::ReactionNotFound.field_errors();
        assert_eq!(errors.get("No_like"), Some("No Like Found"));
    }

    #[test]
    fn empty_field_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
        let err = FieldErrors::single("Required_title", "Title is required")
            .into_result()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
