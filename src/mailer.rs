use async_trait::async_trait;

use crate::error::AppResult;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_email(&self, to: &str, token: &str) -> AppResult<()>;
}

/// Mailer that records the reset link in the log instead of sending it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from_address: String,
    reset_url: String,
}

impl LogMailer {
    pub fn new(from_address: impl Into<String>, reset_url: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
            reset_url: reset_url.into(),
        }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/{}", self.reset_url.trim_end_matches('/'), token)
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_reset_email(&self, to: &str, token: &str) -> AppResult<()> {
        tracing::info!(
            "Password reset mail from {} to {}: {}",
            self.from_address,
            to,
            self.reset_link(token)
        );
        Ok(())
    }
}
