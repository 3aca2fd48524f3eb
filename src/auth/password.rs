use crate::error::{AppError, AppResult};

pub fn hash(plain: &str) -> AppResult<String> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST).map_err(|e| AppError::Internal(e.to_string()))
}

/// Constant-time via bcrypt; a malformed stored hash never verifies.
pub fn verify(hash: &str, plain: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}
