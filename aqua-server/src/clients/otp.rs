//! Email confirmation codes
//!
//! Short-lived per-email state: the issued code, when it was sent, how many
//! wrong guesses were made, and whether a send is currently in flight.
//! Entries expire after the configured TTL; [`CodeStore::purge_expired`] is
//! run periodically to evict them.

use std::time::Instant;

use dashmap::DashMap;
use rand::Rng;
use thiserror::Error;

use crate::core::config::OtpConfig;
use crate::utils::{AppError, ErrorCode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("A code was sent recently, retry in {0}s")]
    Cooldown(u64),

    #[error("A code is already being sent to this address")]
    SendInProgress,

    #[error("Verification code expired or not requested")]
    Expired,

    #[error("Invalid verification code, {0} attempts left")]
    Invalid(u32),

    #[error("Too many attempts, request a new code")]
    TooManyAttempts,
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        let code = match &err {
            OtpError::Cooldown(_) => ErrorCode::CodeResendCooldown,
            OtpError::SendInProgress => ErrorCode::CodeSendInProgress,
            OtpError::Expired => ErrorCode::VerificationCodeExpired,
            OtpError::Invalid(_) => ErrorCode::VerificationCodeInvalid,
            OtpError::TooManyAttempts => ErrorCode::TooManyAttempts,
        };
        let app = AppError::with_message(code, err.to_string());
        match err {
            OtpError::Cooldown(secs) => app.with_detail("retry_after_secs", secs),
            OtpError::Invalid(left) => app.with_detail("attempts_left", left),
            _ => app,
        }
    }
}

#[derive(Debug, Clone)]
struct CodeEntry {
    code: String,
    sent_at: Instant,
    attempts: u32,
}

/// Expiring confirmation-code store
#[derive(Debug)]
pub struct CodeStore {
    entries: DashMap<String, CodeEntry>,
    in_flight: DashMap<String, Instant>,
    config: OtpConfig,
}

/// Marks a send as in flight until dropped
pub struct SendGuard<'a> {
    store: &'a CodeStore,
    mail: String,
}

impl SendGuard<'_> {
    /// Generate and store a fresh code for this email
    pub fn issue(&self) -> String {
        let code = generate_code();
        self.store.entries.insert(
            self.mail.clone(),
            CodeEntry {
                code: code.clone(),
                sent_at: Instant::now(),
                attempts: 0,
            },
        );
        code
    }

    /// Drop the issued code (delivery failed)
    pub fn discard(&self) {
        self.store.entries.remove(&self.mail);
    }
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.store.in_flight.remove(&self.mail);
    }
}

fn generate_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

impl CodeStore {
    pub fn new(config: OtpConfig) -> Self {
        Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Claim the right to send a code to `mail`
    ///
    /// Fails while another send for the same address is running or while the
    /// previous code is inside its cooldown window.
    pub fn begin_send(&self, mail: &str) -> Result<SendGuard<'_>, OtpError> {
        if let Some(entry) = self.entries.get(mail) {
            let elapsed = entry.sent_at.elapsed();
            if elapsed < self.config.cooldown {
                let left = (self.config.cooldown - elapsed).as_secs().max(1);
                return Err(OtpError::Cooldown(left));
            }
        }

        match self.in_flight.entry(mail.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(OtpError::SendInProgress),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                Ok(SendGuard {
                    store: self,
                    mail: mail.to_string(),
                })
            }
        }
    }

    /// Check a code; consumes it on success
    pub fn verify(&self, mail: &str, code: &str) -> Result<(), OtpError> {
        let Some(mut entry) = self.entries.get_mut(mail) else {
            return Err(OtpError::Expired);
        };

        if entry.sent_at.elapsed() > self.config.ttl {
            drop(entry);
            self.entries.remove(mail);
            return Err(OtpError::Expired);
        }

        if entry.code == code.trim() {
            drop(entry);
            self.entries.remove(mail);
            return Ok(());
        }

        entry.attempts += 1;
        if entry.attempts >= self.config.max_attempts {
            drop(entry);
            self.entries.remove(mail);
            crate::security_log!(WARN, "otp_too_many_attempts", mail = %mail);
            return Err(OtpError::TooManyAttempts);
        }
        Err(OtpError::Invalid(self.config.max_attempts - entry.attempts))
    }

    /// Remove expired codes and stale in-flight markers, returns how many codes went
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let ttl = self.config.ttl;
        self.entries.retain(|_, e| e.sent_at.elapsed() <= ttl);
        self.in_flight.retain(|_, started| started.elapsed() <= ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
