//! Outgoing mail
//!
//! Verification codes and admin notices go through the [`Mailer`] seam. The
//! default [`LogMailer`] only writes the message to the log.

use async_trait::async_trait;

use super::NotifyError;

#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;

    async fn send_verification_code(&self, to: &str, code: &str, ttl_secs: u64) -> Result<(), NotifyError> {
        let minutes = (ttl_secs / 60).max(1);
        let body = format!(
            "Your verification code is: {code}\n\
             Valid for {minutes} minutes."
        );
        self.send(to, "Your verification code", &body).await?;
        tracing::info!(to = to, "Verification code sent");
        Ok(())
    }
}

/// Writes mails to the log instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(to = to, subject = subject, body_len = body.len(), "Mail (log only)");
        Ok(())
    }
}
