//! Forgot/reset password flow. Links are single-use reset tokens.

use rusqlite::Connection;
use serde::Deserialize;

use super::{password, session};
use crate::db::models::PasswordReset;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::store::users::MIN_PASSWORD_LEN;
use crate::store::{is_valid_email, resets, sanitize, users, Input};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForgotRequest {
    pub email: String,
}

impl Input for ForgotRequest {
    fn sanitized(self) -> Self {
        Self {
            email: sanitize(&self.email),
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.email.is_empty() {
            errors.add("Required_email", "Required Email");
        } else if !is_valid_email(&self.email) {
            errors.add("Invalid_email", "Invalid Email");
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetRequest {
    pub token: String,
    pub new_password: String,
    pub retype_password: String,
}

impl Input for ResetRequest {
    fn sanitized(self) -> Self {
        Self {
            token: self.token.trim().to_string(),
            ..self
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.token.is_empty() {
            errors.add("Invalid_token", "Invalid link. Try requesting again");
        }
        if self.new_password.is_empty() || self.retype_password.is_empty() {
            errors.add("Empty_passwords", "Please ensure both field are entered");
        } else if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("Invalid_password", "Password should be atleast 6 characters");
        } else if self.new_password != self.retype_password {
            errors.add("Password_unequal", "Passwords provided do not match");
        }
        errors
    }
}

fn invalid_token() -> AppError {
    AppError::Validation(FieldErrors::single(
        "Invalid_token",
        "Invalid link. Try requesting again",
    ))
}

/// Issue a fresh reset token for a known email, revoking older ones.
pub fn request_reset(conn: &Connection, request: &ForgotRequest) -> AppResult<PasswordReset> {
    if users::find_by_email(conn, &request.email)?.is_none() {
        return Err(AppError::Validation(FieldErrors::single(
            "No_email",
            "Sorry, we do not recognize this email",
        )));
    }

    resets::delete_for_email(conn, &request.email)?;
    let reset = resets::create(conn, &request.email, &session::generate_token())?;
    tracing::info!("Password reset requested for {}", request.email);
    Ok(reset)
}

/// Consume a reset token and set the new password.
pub fn reset_password(conn: &Connection, request: &ResetRequest) -> AppResult<()> {
    let reset = resets::find_by_token(conn, &request.token)?.ok_or_else(invalid_token)?;

    let hash = password::hash(&request.new_password)?;
    if users::set_password_by_email(conn, &reset.email, &hash)? == 0 {
        tracing::warn!("Reset token for {} matches no account", reset.email);
        return Err(invalid_token());
    }
    resets::delete(conn, reset.id)?;

    tracing::info!("Password reset completed for {}", reset.email);
    Ok(())
}
