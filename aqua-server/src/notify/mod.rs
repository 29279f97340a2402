//! Notifications: status pushes and mail

pub mod mailer;
pub mod push;

pub use mailer::{LogMailer, Mailer};
pub use push::{ExpoPushSender, LogPushSender, PushDispatcher, PushSender};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected by provider: {0}")]
    Rejected(String),
}
