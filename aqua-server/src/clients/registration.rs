//! Email + confirmation-code registration

use std::sync::Arc;

use shared::models::ClientAccount;
use shared::util::{normalize_email, now_millis, snowflake_id};

use super::otp::CodeStore;
use crate::db::{Storage, StorageError};
use crate::notify::Mailer;
use crate::utils::validation::validate_email;
use crate::utils::{AppError, AppResult, ErrorCode};

#[derive(Debug, Clone)]
pub struct RegistrationService {
    storage: Storage,
    codes: Arc<CodeStore>,
    mailer: Arc<dyn Mailer>,
    default_price12: f64,
    default_price19: f64,
}

impl RegistrationService {
    pub fn new(
        storage: Storage,
        codes: Arc<CodeStore>,
        mailer: Arc<dyn Mailer>,
        default_price12: f64,
        default_price19: f64,
    ) -> Self {
        Self {
            storage,
            codes,
            mailer,
            default_price12,
            default_price19,
        }
    }

    pub fn codes(&self) -> &Arc<CodeStore> {
        &self.codes
    }

    /// Issue a code and mail it
    pub async fn send_code(&self, mail: &str) -> AppResult<()> {
        validate_email(mail)?;
        let mail = normalize_email(mail);

        let guard = self.codes.begin_send(&mail)?;
        let code = guard.issue();
        let ttl = self.codes.config().ttl.as_secs();

        if let Err(e) = self.mailer.send_verification_code(&mail, &code, ttl).await {
            guard.discard();
            tracing::error!(mail = %mail, error = %e, "Failed to send verification code");
            return Err(AppError::with_message(
                ErrorCode::NetworkError,
                "Could not send the verification code, try again later",
            ));
        }
        Ok(())
    }

    /// Verify a code; creates the account on first confirmation
    pub fn confirm_code(&self, mail: &str, code: &str) -> AppResult<ClientAccount> {
        validate_email(mail)?;
        let mail = normalize_email(mail);
        self.codes.verify(&mail, code)?;

        let txn = self.storage.begin_write()?;
        if let Some(existing) = self.storage.find_client_by_email_txn(&txn, &mail)? {
            tracing::info!(client = %mail, "Client signed in");
            return Ok(existing);
        }

        let mut id = snowflake_id();
        while self.storage.get_client_txn(&txn, id)?.is_some() {
            id = snowflake_id();
        }
        let client = ClientAccount::new(
            id,
            mail.clone(),
            self.default_price12,
            self.default_price19,
            now_millis(),
        );
        self.storage.put_client(&txn, &client)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(client = %mail, client_id = client.id, "Client registered");
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::OtpConfig;
    use crate::notify::mailer::testing::RecordingMailer;
    use shared::models::PaymentPreference;

    fn service() -> (RegistrationService, Arc<RecordingMailer>) {
        let storage = Storage::open_in_memory().unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let codes = Arc::new(CodeStore::new(OtpConfig {
            cooldown: std::time::Duration::ZERO,
            ..OtpConfig::default()
        }));
        let svc = RegistrationService::new(storage, codes, mailer.clone(), 900.0, 1300.0);
        (svc, mailer)
    }

    fn code_from(body: &str) -> String {
        body.chars().filter(|c| c.is_ascii_digit()).take(6).collect()
    }

    #[tokio::test]
    async fn test_register_with_code() {
        let (svc, mailer) = service();
        svc.send_code("New@Mail.kz").await.unwrap();

        let code = code_from(&mailer.last_body_for("new@mail.kz").unwrap());
        let client = svc.confirm_code("new@mail.kz", &code).unwrap();
        assert_eq!(client.mail, "new@mail.kz");
        assert_eq!(client.payment_preference, PaymentPreference::Balance);
        assert_eq!(client.price12, 900.0);

        // Signing in again returns the same account
        svc.send_code("new@mail.kz").await.unwrap();
        let code = code_from(&mailer.last_body_for("new@mail.kz").unwrap());
        assert_eq!(svc.confirm_code("new@mail.kz", &code).unwrap().id, client.id);
        assert_eq!(mailer.count(), 2);
    }

    #[tokio::test]
    async fn test_wrong_code_creates_nothing() {
        let (svc, _) = service();
        svc.send_code("x@mail.kz").await.unwrap();
        let err = svc.confirm_code("x@mail.kz", "12345").unwrap_err();
        assert_eq!(err.code, ErrorCode::VerificationCodeInvalid);
        assert!(svc.storage.find_client_by_email("x@mail.kz").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let (svc, mailer) = service();
        assert!(svc.send_code("nope").await.is_err());
        assert_eq!(mailer.count(), 0);
    }
}
