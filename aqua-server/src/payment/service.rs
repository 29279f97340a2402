//! Payment service
//!
//! Gateway calls never touch the ledger on their own. A top-up is applied
//! only after the gateway confirms the payment (signed callback or a
//! successful direct charge), and the ledger write, the [`PaymentRecord`]
//! update and the saved card land in one write transaction.

use std::sync::Arc;

use shared::request::CreatePaymentLinkRequest;
use shared::response::{PaymentLink, SavedCardView, TopUpResult};
use shared::types::Id;
use shared::util::{normalize_email, now_millis};

use super::callback::{CallbackNotice, CallbackPayload};
use super::error::{PaymentError, PaymentResult};
use super::gateway::{LinkRequest, PaymentGateway};
use crate::db::{PaymentRecord, PaymentStatus, SavedCard, Storage, StorageError};
use crate::ledger::LedgerService;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_amount, validate_email, validate_text_len};

/// What a callback did
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// Balance credited; carries the new balance
    Credited(f64),
    /// Gateway reported a failed payment
    Failed,
    /// Already settled earlier
    Duplicate,
}

fn new_transaction_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone)]
pub struct PaymentService {
    storage: Storage,
    ledger: LedgerService,
    gateway: Arc<dyn PaymentGateway>,
    callback_secret: String,
}

impl PaymentService {
    pub fn new(
        storage: Storage,
        ledger: LedgerService,
        gateway: Arc<dyn PaymentGateway>,
        callback_secret: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            ledger,
            gateway,
            callback_secret: callback_secret.into(),
        }
    }

    /// Request a hosted payment page for a balance top-up
    ///
    /// Stores a pending [`PaymentRecord`] so the callback can be matched to
    /// the client; the balance is untouched.
    pub async fn create_payment_link(&self, req: &CreatePaymentLinkRequest) -> AppResult<PaymentLink> {
        validate_amount(req.sum, "sum")?;
        validate_email(&req.mail)?;
        validate_text_len(&req.phone, "phone", MAX_SHORT_TEXT_LEN)?;

        let mail = normalize_email(&req.mail);
        let client = self
            .storage
            .find_client_by_email(&mail)?
            .ok_or_else(|| PaymentError::ClientNotFound(mail.clone()))?;

        let transaction_id = new_transaction_id();
        let phone = if req.phone.trim().is_empty() {
            client.phone.as_str()
        } else {
            req.phone.trim()
        };
        let payment_url = self
            .gateway
            .create_link(&LinkRequest {
                transaction_id: &transaction_id,
                amount: req.sum,
                mail: &mail,
                phone,
            })
            .await
            .map_err(|e| {
                tracing::error!(client = %mail, error = %e, "Failed to create payment link");
                PaymentError::from(e)
            })?;

        let now = now_millis();
        let record = PaymentRecord {
            transaction_id: transaction_id.clone(),
            client_id: client.id,
            amount: req.sum,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let txn = self.storage.begin_write()?;
        self.storage.put_payment(&txn, &record)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            client = %mail,
            transaction_id = %transaction_id,
            amount = req.sum,
            "Payment link created"
        );
        Ok(PaymentLink {
            payment_url,
            transaction_id,
        })
    }

    /// Settle a gateway callback
    ///
    /// Idempotent by transaction id: once a record leaves `Pending`, later
    /// deliveries are reported as [`CallbackOutcome::Duplicate`].
    pub fn handle_callback(&self, payload: &CallbackPayload) -> PaymentResult<CallbackOutcome> {
        payload.verify_signature(&self.callback_secret)?;
        let notice = payload.notice()?;
        self.settle(&notice)
    }

    fn settle(&self, notice: &CallbackNotice) -> PaymentResult<CallbackOutcome> {
        let txn = self.storage.begin_write()?;
        let mut record = self
            .storage
            .get_payment_txn(&txn, &notice.transaction_id)?
            .ok_or_else(|| PaymentError::UnknownTransaction(notice.transaction_id.clone()))?;

        if record.status != PaymentStatus::Pending {
            tracing::info!(
                transaction_id = %record.transaction_id,
                status = ?record.status,
                "Duplicate payment callback, skipping"
            );
            return Ok(CallbackOutcome::Duplicate);
        }

        if let Some(received) = notice.amount
            && (received - record.amount).abs() > 0.005
        {
            crate::security_log!(
                WARN,
                "callback_amount_mismatch",
                transaction_id = %record.transaction_id,
                expected = record.amount,
                received = received
            );
            return Err(PaymentError::AmountMismatch {
                expected: record.amount,
                received,
            });
        }

        record.updated_at = now_millis();
        if !notice.succeeded {
            record.status = PaymentStatus::Failed;
            self.storage.put_payment(&txn, &record)?;
            txn.commit().map_err(StorageError::from)?;
            tracing::warn!(transaction_id = %record.transaction_id, "Gateway reported failed payment");
            return Ok(CallbackOutcome::Failed);
        }

        let balance = self
            .ledger
            .apply_top_up(&txn, record.client_id, &record.transaction_id, record.amount)?
            .balance();
        record.status = PaymentStatus::Succeeded;
        self.storage.put_payment(&txn, &record)?;

        if let Some(card) = &notice.card {
            let saved = SavedCard {
                client_id: record.client_id,
                token: card.token.clone(),
                masked_pan: card.masked_pan.clone(),
                expiry: card.expiry.clone(),
                created_at: record.updated_at,
            };
            self.storage.put_saved_card(&txn, &saved)?;
            tracing::info!(client_id = record.client_id, masked_pan = %saved.masked_pan, "Card saved");
        }
        txn.commit().map_err(StorageError::from)?;

        Ok(CallbackOutcome::Credited(balance))
    }

    /// Charge the client's saved card and credit the balance on success
    pub async fn charge_saved_card(&self, client_id: Id, amount: f64) -> AppResult<TopUpResult> {
        validate_amount(amount, "amount")?;
        let card = self
            .storage
            .get_saved_card(client_id)?
            .ok_or(PaymentError::SavedCardNotFound(client_id))?;

        let transaction_id = new_transaction_id();
        self.gateway
            .charge_token(&card.token, amount, &transaction_id)
            .await
            .map_err(|e| {
                tracing::warn!(client_id, transaction_id = %transaction_id, error = %e, "Saved card charge failed");
                PaymentError::from(e)
            })?;

        let now = now_millis();
        let txn = self.storage.begin_write()?;
        let balance = self
            .ledger
            .apply_top_up(&txn, client_id, &transaction_id, amount)
            .map_err(PaymentError::from)?
            .balance();
        let record = PaymentRecord {
            transaction_id: transaction_id.clone(),
            client_id,
            amount,
            status: PaymentStatus::Succeeded,
            created_at: now,
            updated_at: now,
        };
        self.storage.put_payment(&txn, &record)?;
        txn.commit().map_err(StorageError::from)?;

        Ok(TopUpResult {
            transaction_id,
            balance,
        })
    }

    pub fn get_saved_card(&self, client_id: Id) -> AppResult<SavedCardView> {
        let card = self
            .storage
            .get_saved_card(client_id)?
            .ok_or(PaymentError::SavedCardNotFound(client_id))?;
        Ok(SavedCardView {
            masked_pan: card.masked_pan,
            expiry: card.expiry,
        })
    }

    /// Forget the card at the gateway, then locally
    pub async fn delete_saved_card(&self, client_id: Id) -> AppResult<()> {
        let card = self
            .storage
            .get_saved_card(client_id)?
            .ok_or(PaymentError::SavedCardNotFound(client_id))?;
        self.gateway
            .delete_card(&card.token)
            .await
            .map_err(PaymentError::from)?;

        let txn = self.storage.begin_write()?;
        self.storage.remove_saved_card(&txn, client_id)?;
        txn.commit().map_err(StorageError::from)?;
        tracing::info!(client_id, "Saved card deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::gateway::testing::StubGateway;
    use crate::payment::signing;
    use shared::models::ClientAccount;
    use shared::{ErrorCode, FundsPolicy};

    const SECRET: &str = "cb-secret";

    fn setup(gateway: StubGateway) -> (Storage, PaymentService, Arc<StubGateway>, ClientAccount) {
        let storage = Storage::open_in_memory().unwrap();
        let ledger = LedgerService::new(storage.clone(), FundsPolicy::Strict, 50);
        let gateway = Arc::new(gateway);
        let service = PaymentService::new(storage.clone(), ledger, gateway.clone(), SECRET);

        let mut client = ClientAccount::new(7, "a@mail.kz".into(), 900.0, 1300.0, 0);
        client.phone = "+77010000000".into();
        client.balance = 100.0;
        let txn = storage.begin_write().unwrap();
        storage.put_client(&txn, &client).unwrap();
        txn.commit().unwrap();
        (storage, service, gateway, client)
    }

    fn link_request(sum: f64) -> CreatePaymentLinkRequest {
        CreatePaymentLinkRequest {
            sum,
            mail: "A@mail.kz".into(),
            phone: String::new(),
        }
    }

    fn callback(transaction_id: &str, status: &str, extra: &[(&str, &str)]) -> CallbackPayload {
        let mut fields = vec![("transaction_id", transaction_id), ("status", status)];
        fields.extend_from_slice(extra);
        let sig = signing::sign(SECRET, fields.iter().copied());
        let mut pairs: Vec<(String, String)> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        pairs.push(("signature".into(), sig));
        CallbackPayload::from_pairs(pairs)
    }

    fn balance(storage: &Storage) -> f64 {
        storage.get_client(7).unwrap().unwrap().balance
    }

    #[tokio::test]
    async fn test_link_does_not_touch_ledger() {
        let (storage, service, gateway, _) = setup(StubGateway::default());
        let link = service.create_payment_link(&link_request(500.0)).await.unwrap();

        assert!(link.payment_url.ends_with(&link.transaction_id));
        assert_eq!(gateway.calls(), vec![format!("link:{}", link.transaction_id)]);
        let record = storage.get_payment(&link.transaction_id).unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Pending);
        assert_eq!(record.client_id, 7);
        assert_eq!(balance(&storage), 100.0);
    }

    #[tokio::test]
    async fn test_link_gateway_down() {
        let (storage, service, _, _) = setup(StubGateway::offline());
        let err = service.create_payment_link(&link_request(500.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GatewayUnavailable);
        assert_eq!(balance(&storage), 100.0);
    }

    #[tokio::test]
    async fn test_link_validation() {
        let (_, service, gateway, _) = setup(StubGateway::default());
        assert!(service.create_payment_link(&link_request(0.0)).await.is_err());

        let mut unknown = link_request(10.0);
        unknown.mail = "ghost@mail.kz".into();
        let err = service.create_payment_link(&unknown).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ClientNotFound);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_callback_credits_once() {
        let (storage, service, _, _) = setup(StubGateway::default());
        let link = service.create_payment_link(&link_request(500.0)).await.unwrap();
        let payload = callback(&link.transaction_id, "success", &[("amount", "500.00")]);

        assert_eq!(
            service.handle_callback(&payload).unwrap(),
            CallbackOutcome::Credited(600.0)
        );
        assert_eq!(service.handle_callback(&payload).unwrap(), CallbackOutcome::Duplicate);
        assert_eq!(balance(&storage), 600.0);
        assert_eq!(
            storage.get_payment(&link.transaction_id).unwrap().unwrap().status,
            PaymentStatus::Succeeded
        );
    }

    #[tokio::test]
    async fn test_failed_callback_no_mutation() {
        let (storage, service, _, _) = setup(StubGateway::default());
        let link = service.create_payment_link(&link_request(500.0)).await.unwrap();

        let outcome = service
            .handle_callback(&callback(&link.transaction_id, "declined", &[]))
            .unwrap();
        assert_eq!(outcome, CallbackOutcome::Failed);
        assert_eq!(balance(&storage), 100.0);

        // A late success for the same transaction is ignored
        let late = callback(&link.transaction_id, "success", &[]);
        assert_eq!(service.handle_callback(&late).unwrap(), CallbackOutcome::Duplicate);
        assert_eq!(balance(&storage), 100.0);
    }

    #[tokio::test]
    async fn test_callback_rejections() {
        let (storage, service, _, _) = setup(StubGateway::default());
        let link = service.create_payment_link(&link_request(500.0)).await.unwrap();

        let genuine = callback(&link.transaction_id, "success", &[]);
        let forged = CallbackPayload::from_pairs([
            ("transaction_id", link.transaction_id.as_str()),
            ("status", "success"),
            ("signature", genuine.get("signature").unwrap()),
            ("amount", "99999"),
        ]);
        assert!(matches!(
            service.handle_callback(&forged),
            Err(PaymentError::InvalidSignature)
        ));

        let wrong_amount = callback(&link.transaction_id, "success", &[("amount", "5000.00")]);
        assert!(matches!(
            service.handle_callback(&wrong_amount),
            Err(PaymentError::AmountMismatch { .. })
        ));

        let unknown = callback("nope", "success", &[]);
        assert!(matches!(
            service.handle_callback(&unknown),
            Err(PaymentError::UnknownTransaction(_))
        ));

        assert_eq!(balance(&storage), 100.0);
        assert_eq!(
            storage.get_payment(&link.transaction_id).unwrap().unwrap().status,
            PaymentStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_saved_card_lifecycle() {
        let (storage, service, gateway, _) = setup(StubGateway::default());
        assert_eq!(
            service.charge_saved_card(7, 100.0).await.unwrap_err().code,
            ErrorCode::SavedCardNotFound
        );

        let link = service.create_payment_link(&link_request(200.0)).await.unwrap();
        let payload = callback(
            &link.transaction_id,
            "success",
            &[("card_token", "tok_9"), ("card_mask", "4400****9999"), ("card_expiry", "12/27")],
        );
        service.handle_callback(&payload).unwrap();

        let view = service.get_saved_card(7).unwrap();
        assert_eq!(view.masked_pan, "4400****9999");
        assert_eq!(view.expiry.as_deref(), Some("12/27"));

        let result = service.charge_saved_card(7, 150.0).await.unwrap();
        assert_eq!(result.balance, 450.0);
        assert_eq!(balance(&storage), 450.0);
        assert!(gateway.calls().contains(&"charge:tok_9:150.00".to_string()));

        service.delete_saved_card(7).await.unwrap();
        assert!(gateway.calls().contains(&"delete:tok_9".to_string()));
        assert_eq!(
            service.get_saved_card(7).unwrap_err().code,
            ErrorCode::SavedCardNotFound
        );
    }

    #[tokio::test]
    async fn test_declined_charge_leaves_balance() {
        let (storage, service, _, _) = setup(StubGateway::declining("Insufficient funds on card"));
        let txn = storage.begin_write().unwrap();
        storage
            .put_saved_card(
                &txn,
                &SavedCard {
                    client_id: 7,
                    token: "tok_1".into(),
                    masked_pan: "4400****1111".into(),
                    expiry: None,
                    created_at: 0,
                },
            )
            .unwrap();
        txn.commit().unwrap();

        let err = service.charge_saved_card(7, 300.0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentFailed);
        assert!(err.message.contains("Insufficient funds on card"));
        assert_eq!(balance(&storage), 100.0);
    }
}
