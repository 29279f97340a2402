//! Settlement Ledger
//!
//! Applies balance and bottle-credit deltas to a client account. Every
//! mutation runs inside the caller's redb write transaction together with an
//! idempotency record in the `settlements` table, so a retried request finds
//! the record and applies nothing.
//!
//! | Operation | Idempotency key |
//! |-----------|-----------------|
//! | [`LedgerService::charge_for_order`] | `{order_id}:charge` |
//! | [`LedgerService::refund_for_cancelled_order`] | `{order_id}:refund` |
//! | [`LedgerService::apply_top_up`] | `topup:{transaction_id}` |
//! | [`LedgerService::adjust`] | `adjust:{request_id}` |

use redb::WriteTransaction;
use shared::ledger::{self, AppliedCharge, FundsPolicy, LedgerAdjustment, LedgerError};
use shared::models::ClientAccount;
use shared::order::{OpForm, Order};
use shared::types::Id;
use shared::util::{normalize_email, now_millis};
use thiserror::Error;

use crate::db::{SettlementKind, SettlementRecord, Storage, StorageError};
use crate::utils::{AppError, ErrorCode};

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type SettlementResult<T> = Result<T, SettlementError>;

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        match err {
            SettlementError::Ledger(e) => {
                let code = match &e {
                    LedgerError::PaymentMethodMismatch { .. } => ErrorCode::PaymentMethodMismatch,
                    LedgerError::InsufficientBalance { .. }
                    | LedgerError::InsufficientBottles { .. } => ErrorCode::InsufficientFunds,
                    LedgerError::InvalidAmount(_) => ErrorCode::ValueOutOfRange,
                };
                AppError::with_message(code, e.to_string())
            }
            SettlementError::ClientNotFound(who) => {
                AppError::with_message(ErrorCode::ClientNotFound, format!("Client not found: {who}"))
            }
            SettlementError::Storage(e) => e.into(),
        }
    }
}

/// Result of a top-up attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TopUpOutcome {
    /// Balance credited; carries the new balance
    Applied(f64),
    /// Transaction already credited earlier; carries the current balance
    Duplicate(f64),
}

impl TopUpOutcome {
    pub fn balance(&self) -> f64 {
        match self {
            TopUpOutcome::Applied(b) | TopUpOutcome::Duplicate(b) => *b,
        }
    }
}

/// Ledger mutations over the shared storage
#[derive(Debug, Clone)]
pub struct LedgerService {
    storage: Storage,
    policy: FundsPolicy,
    order_bonus: i64,
}

impl LedgerService {
    pub fn new(storage: Storage, policy: FundsPolicy, order_bonus: i64) -> Self {
        Self {
            storage,
            policy,
            order_bonus,
        }
    }

    pub fn policy(&self) -> FundsPolicy {
        self.policy
    }

    fn load_client(&self, txn: &WriteTransaction, client_id: Id) -> SettlementResult<ClientAccount> {
        self.storage
            .get_client_txn(txn, client_id)?
            .ok_or_else(|| SettlementError::ClientNotFound(client_id.to_string()))
    }

    fn record(
        &self,
        txn: &WriteTransaction,
        key: String,
        kind: SettlementKind,
        client_id: Id,
        balance_delta: f64,
        bottles12_delta: i64,
        bottles19_delta: i64,
    ) -> SettlementResult<()> {
        let record = SettlementRecord {
            key,
            kind,
            client_id,
            balance_delta,
            bottles12_delta,
            bottles19_delta,
            created_at: now_millis(),
        };
        self.storage.put_settlement(txn, &record)?;
        Ok(())
    }

    /// Debit a new order and award the placement bonus
    ///
    /// Writes `order.applied_charge`; the caller persists the order. The
    /// updated client is persisted here and returned.
    pub fn charge_for_order(
        &self,
        txn: &WriteTransaction,
        client: &mut ClientAccount,
        order: &mut Order,
    ) -> SettlementResult<AppliedCharge> {
        let key = SettlementRecord::charge_key(order.id);
        if self.storage.get_settlement_txn(txn, &key)?.is_some() {
            tracing::debug!(order_id = order.id, "Charge already applied");
            return Ok(order.applied_charge.unwrap_or_default());
        }

        let charge = ledger::plan_charge(client, order.op_form, &order.products, order.sum, self.policy)?;
        ledger::apply_charge(client, &charge);
        ledger::award_bonus(client, self.order_bonus);
        client.updated_at = now_millis();

        self.storage.put_client(txn, client)?;
        self.record(
            txn,
            key,
            SettlementKind::Charge,
            client.id,
            -charge.balance,
            -charge.bottles12,
            -charge.bottles19,
        )?;
        order.applied_charge = (!charge.is_empty()).then_some(charge);

        tracing::info!(
            order_id = order.id,
            client = %client.mail,
            op_form = %order.op_form,
            balance = client.balance,
            paid_bootles_for12 = client.paid_bootles_for12,
            paid_bootles_for19 = client.paid_bootles_for19,
            "Order charged"
        );
        Ok(charge)
    }

    /// Reverse what the order's charge debited
    ///
    /// Returns `None` when the refund was already applied.
    pub fn refund_for_cancelled_order(
        &self,
        txn: &WriteTransaction,
        order: &Order,
    ) -> SettlementResult<Option<AppliedCharge>> {
        let key = SettlementRecord::refund_key(order.id);
        if self.storage.get_settlement_txn(txn, &key)?.is_some() {
            tracing::debug!(order_id = order.id, "Refund already applied");
            return Ok(None);
        }

        let charge = order.applied_charge.unwrap_or_else(|| recorded_charge(order));
        if !charge.is_empty() {
            let mut client = self.load_client(txn, order.client)?;
            ledger::apply_refund(&mut client, &charge);
            client.updated_at = now_millis();
            self.storage.put_client(txn, &client)?;
            tracing::info!(
                order_id = order.id,
                client = %client.mail,
                balance = client.balance,
                paid_bootles_for12 = client.paid_bootles_for12,
                paid_bootles_for19 = client.paid_bootles_for19,
                "Order refunded"
            );
        }

        self.record(
            txn,
            key,
            SettlementKind::Refund,
            order.client,
            charge.balance,
            charge.bottles12,
            charge.bottles19,
        )?;
        Ok(Some(charge))
    }

    /// Credit a confirmed gateway payment
    pub fn apply_top_up(
        &self,
        txn: &WriteTransaction,
        client_id: Id,
        transaction_id: &str,
        amount: f64,
    ) -> SettlementResult<TopUpOutcome> {
        let mut client = self.load_client(txn, client_id)?;
        let key = SettlementRecord::top_up_key(transaction_id);
        if self.storage.get_settlement_txn(txn, &key)?.is_some() {
            tracing::info!(transaction_id = %transaction_id, "Top-up already applied");
            return Ok(TopUpOutcome::Duplicate(client.balance));
        }

        ledger::apply_top_up(&mut client, amount)?;
        client.updated_at = now_millis();
        self.storage.put_client(txn, &client)?;
        self.record(txn, key, SettlementKind::TopUp, client_id, amount, 0, 0)?;

        tracing::info!(
            client = %client.mail,
            transaction_id = %transaction_id,
            amount,
            balance = client.balance,
            "Balance topped up"
        );
        Ok(TopUpOutcome::Applied(client.balance))
    }

    /// Staff-side adjustment in its own transaction
    pub fn adjust(
        &self,
        mail: &str,
        request_id: &str,
        adjustment: &LedgerAdjustment,
        note: Option<&str>,
    ) -> SettlementResult<ClientAccount> {
        let mail = normalize_email(mail);
        let txn = self.storage.begin_write()?;
        let mut client = self
            .storage
            .find_client_by_email_txn(&txn, &mail)?
            .ok_or_else(|| SettlementError::ClientNotFound(mail.clone()))?;

        let key = SettlementRecord::adjust_key(request_id);
        if self.storage.get_settlement_txn(&txn, &key)?.is_some() {
            tracing::info!(request_id = %request_id, "Adjustment already applied");
            return Ok(client);
        }

        ledger::apply_adjustment(&mut client, adjustment, self.policy)?;
        client.updated_at = now_millis();
        self.storage.put_client(&txn, &client)?;
        self.record(
            &txn,
            key,
            SettlementKind::Adjustment,
            client.id,
            adjustment.balance,
            adjustment.bottles12,
            adjustment.bottles19,
        )?;
        txn.commit().map_err(StorageError::from)?;

        crate::audit_log!(
            "ledger_adjust",
            "client",
            client = %client.mail,
            request_id = %request_id,
            balance_delta = adjustment.balance,
            bottles12_delta = adjustment.bottles12,
            bottles19_delta = adjustment.bottles19,
            note = note.unwrap_or_default()
        );
        Ok(client)
    }
}

/// Charge implied by an order stored without an `applied_charge` record
fn recorded_charge(order: &Order) -> AppliedCharge {
    match order.op_form {
        OpForm::Credit => AppliedCharge {
            balance: order.sum,
            ..Default::default()
        },
        OpForm::Coupon => AppliedCharge {
            balance: 0.0,
            bottles12: i64::from(order.products.b12),
            bottles19: i64::from(order.products.b19),
        },
        OpForm::Fakt | OpForm::Card => AppliedCharge::default(),
    }
}
