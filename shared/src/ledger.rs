//! Ledger arithmetic
//!
//! Pure functions over [`ClientAccount`] that compute and apply balance and
//! bottle-credit deltas. The server runs them inside a storage write
//! transaction; the mobile core runs [`plan_charge`] as a pre-submission check.
//!
//! All money math is done in `Decimal`, then stored back as `f64` rounded to
//! two places.

use crate::models::{ClientAccount, PaymentPreference};
use crate::order::{OpForm, Products};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in ledger calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Whether a charge may drive balance or credits below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundsPolicy {
    /// Reject charges the account cannot cover
    #[default]
    Strict,
    /// Debit unconditionally (balance may go negative; credits are only
    /// touched while positive)
    Lenient,
}

impl std::str::FromStr for FundsPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(FundsPolicy::Strict),
            "lenient" => Ok(FundsPolicy::Lenient),
            other => Err(format!("unknown funds policy '{}'", other)),
        }
    }
}

/// What a charge actually debited; refunds reverse exactly this
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCharge {
    pub balance: f64,
    pub bottles12: i64,
    pub bottles19: i64,
}

impl AppliedCharge {
    pub fn is_empty(&self) -> bool {
        self.balance == 0.0 && self.bottles12 == 0 && self.bottles19 == 0
    }
}

/// Staff-side delta (positive credits the client)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAdjustment {
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub bottles12: i64,
    #[serde(default)]
    pub bottles19: i64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Pay form {op_form} is not enabled for this client (preference: {preference})")]
    PaymentMethodMismatch {
        op_form: OpForm,
        preference: PaymentPreference,
    },

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: f64, available: f64 },

    #[error("Insufficient {size}L bottle credits: required {required}, available {available}")]
    InsufficientBottles {
        size: u8,
        required: i64,
        available: i64,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// `b12 * price12 + b19 * price19`
pub fn order_sum(products: &Products, price12: f64, price19: f64) -> f64 {
    let sum = Decimal::from(products.b12) * to_decimal(price12)
        + Decimal::from(products.b19) * to_decimal(price19);
    to_f64(sum)
}

/// Work out what placing an order debits, without touching the account
pub fn plan_charge(
    account: &ClientAccount,
    op_form: OpForm,
    products: &Products,
    sum: f64,
    policy: FundsPolicy,
) -> Result<AppliedCharge, LedgerError> {
    match op_form {
        OpForm::Fakt | OpForm::Card => Ok(AppliedCharge::default()),
        OpForm::Credit => {
            if account.payment_preference != PaymentPreference::Balance {
                return Err(LedgerError::PaymentMethodMismatch {
                    op_form,
                    preference: account.payment_preference,
                });
            }
            if policy == FundsPolicy::Strict && to_decimal(account.balance) < to_decimal(sum) {
                return Err(LedgerError::InsufficientBalance {
                    required: sum,
                    available: account.balance,
                });
            }
            Ok(AppliedCharge {
                balance: sum,
                ..Default::default()
            })
        }
        OpForm::Coupon => {
            if account.payment_preference != PaymentPreference::Coupon {
                return Err(LedgerError::PaymentMethodMismatch {
                    op_form,
                    preference: account.payment_preference,
                });
            }
            let bottles12 = plan_bottles(12, account.paid_bootles_for12, products.b12, policy)?;
            let bottles19 = plan_bottles(19, account.paid_bootles_for19, products.b19, policy)?;
            Ok(AppliedCharge {
                balance: 0.0,
                bottles12,
                bottles19,
            })
        }
    }
}

fn plan_bottles(size: u8, available: i64, wanted: u32, policy: FundsPolicy) -> Result<i64, LedgerError> {
    let wanted = i64::from(wanted);
    if wanted == 0 {
        return Ok(0);
    }
    match policy {
        FundsPolicy::Strict if available < wanted => Err(LedgerError::InsufficientBottles {
            size,
            required: wanted,
            available,
        }),
        FundsPolicy::Strict => Ok(wanted),
        // Only counters that are still positive get debited
        FundsPolicy::Lenient if available > 0 => Ok(wanted),
        FundsPolicy::Lenient => Ok(0),
    }
}

/// Debit a planned charge
pub fn apply_charge(account: &mut ClientAccount, charge: &AppliedCharge) {
    account.balance = to_f64(to_decimal(account.balance) - to_decimal(charge.balance));
    account.paid_bootles_for12 -= charge.bottles12;
    account.paid_bootles_for19 -= charge.bottles19;
    account.sync_legacy_bottles();
}

/// Reverse a previously applied charge
pub fn apply_refund(account: &mut ClientAccount, charge: &AppliedCharge) {
    account.balance = to_f64(to_decimal(account.balance) + to_decimal(charge.balance));
    account.paid_bootles_for12 += charge.bottles12;
    account.paid_bootles_for19 += charge.bottles19;
    account.sync_legacy_bottles();
}

/// Credit a confirmed gateway payment
pub fn apply_top_up(account: &mut ClientAccount, amount: f64) -> Result<(), LedgerError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::InvalidAmount(format!(
            "top-up must be positive, got {}",
            amount
        )));
    }
    account.balance = to_f64(to_decimal(account.balance) + to_decimal(amount));
    Ok(())
}

/// Loyalty points for a placed order. Never reversed.
pub fn award_bonus(account: &mut ClientAccount, points: i64) {
    account.bonus += points;
}

/// Apply a staff-side adjustment
///
/// Under the strict policy the result may not leave balance or either
/// credit counter negative.
pub fn apply_adjustment(
    account: &mut ClientAccount,
    adjustment: &LedgerAdjustment,
    policy: FundsPolicy,
) -> Result<(), LedgerError> {
    if !adjustment.balance.is_finite() {
        return Err(LedgerError::InvalidAmount("balance delta must be finite".into()));
    }
    let balance = to_decimal(account.balance) + to_decimal(adjustment.balance);
    let b12 = account.paid_bootles_for12 + adjustment.bottles12;
    let b19 = account.paid_bootles_for19 + adjustment.bottles19;

    if policy == FundsPolicy::Strict {
        if balance < Decimal::ZERO {
            return Err(LedgerError::InsufficientBalance {
                required: -adjustment.balance,
                available: account.balance,
            });
        }
        if b12 < 0 {
            return Err(LedgerError::InsufficientBottles {
                size: 12,
                required: -adjustment.bottles12,
                available: account.paid_bootles_for12,
            });
        }
        if b19 < 0 {
            return Err(LedgerError::InsufficientBottles {
                size: 19,
                required: -adjustment.bottles19,
                available: account.paid_bootles_for19,
            });
        }
    }

    account.balance = to_f64(balance);
    account.paid_bootles_for12 = b12;
    account.paid_bootles_for19 = b19;
    account.sync_legacy_bottles();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(pref: PaymentPreference) -> ClientAccount {
        let mut a = ClientAccount::new(1, "a@b.kz".into(), 900.0, 1300.0, 0);
        a.payment_preference = pref;
        a
    }

    #[test]
    fn test_order_sum() {
        let p = Products { b12: 1, b19: 2 };
        assert_eq!(order_sum(&p, 900.0, 1300.0), 3500.0);
        assert_eq!(order_sum(&Products { b12: 3, b19: 0 }, 0.1, 0.0), 0.3);
    }

    #[test]
    fn test_credit_charge_and_refund_symmetry() {
        let mut a = account(PaymentPreference::Balance);
        a.balance = 1000.0;
        let products = Products { b12: 1, b19: 0 };
        let sum = order_sum(&products, a.price12, a.price19);

        let charge = plan_charge(&a, OpForm::Credit, &products, sum, FundsPolicy::Strict).unwrap();
        apply_charge(&mut a, &charge);
        assert_eq!(a.balance, 100.0);

        apply_refund(&mut a, &charge);
        assert_eq!(a.balance, 1000.0);
    }

    #[test]
    fn test_coupon_charge_and_refund_symmetry() {
        let mut a = account(PaymentPreference::Coupon);
        a.paid_bootles_for19 = 3;
        a.sync_legacy_bottles();
        let products = Products { b12: 0, b19: 2 };

        let charge = plan_charge(&a, OpForm::Coupon, &products, 0.0, FundsPolicy::Strict).unwrap();
        apply_charge(&mut a, &charge);
        assert_eq!(a.paid_bootles_for19, 1);
        assert_eq!(a.paid_bootles, 1);

        apply_refund(&mut a, &charge);
        assert_eq!(a.paid_bootles_for19, 3);
        assert_eq!(a.paid_bootles_for12, 0);
        assert_eq!(a.paid_bootles, 3);
    }

    #[test]
    fn test_strict_rejects_overdraft() {
        let mut a = account(PaymentPreference::Balance);
        a.balance = 500.0;
        let err = plan_charge(&a, OpForm::Credit, &Products { b12: 1, b19: 0 }, 900.0, FundsPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_lenient_allows_negative_balance() {
        let mut a = account(PaymentPreference::Balance);
        a.balance = 500.0;
        let charge =
            plan_charge(&a, OpForm::Credit, &Products { b12: 1, b19: 0 }, 900.0, FundsPolicy::Lenient)
                .unwrap();
        apply_charge(&mut a, &charge);
        assert_eq!(a.balance, -400.0);
        apply_refund(&mut a, &charge);
        assert_eq!(a.balance, 500.0);
    }

    #[test]
    fn test_lenient_skips_empty_bottle_counter() {
        let mut a = account(PaymentPreference::Coupon);
        a.paid_bootles_for12 = 0;
        a.paid_bootles_for19 = 1;
        let products = Products { b12: 2, b19: 2 };

        let charge = plan_charge(&a, OpForm::Coupon, &products, 0.0, FundsPolicy::Lenient).unwrap();
        assert_eq!(charge.bottles12, 0);
        assert_eq!(charge.bottles19, 2);

        apply_charge(&mut a, &charge);
        apply_refund(&mut a, &charge);
        assert_eq!(a.paid_bootles_for12, 0);
        assert_eq!(a.paid_bootles_for19, 1);
    }

    #[test]
    fn test_pay_form_must_match_preference() {
        let a = account(PaymentPreference::Coupon);
        let err = plan_charge(&a, OpForm::Credit, &Products { b12: 2, b19: 0 }, 1800.0, FundsPolicy::Lenient)
            .unwrap_err();
        assert!(matches!(err, LedgerError::PaymentMethodMismatch { .. }));
    }

    #[test]
    fn test_cash_and_card_do_not_touch_ledger() {
        let a = account(PaymentPreference::Balance);
        for form in [OpForm::Fakt, OpForm::Card] {
            let charge = plan_charge(&a, form, &Products { b12: 2, b19: 0 }, 1800.0, FundsPolicy::Strict)
                .unwrap();
            assert!(charge.is_empty());
        }
    }

    #[test]
    fn test_top_up_requires_positive_amount() {
        let mut a = account(PaymentPreference::Balance);
        assert!(apply_top_up(&mut a, 0.0).is_err());
        assert!(apply_top_up(&mut a, f64::NAN).is_err());
        apply_top_up(&mut a, 2500.5).unwrap();
        assert_eq!(a.balance, 2500.5);
    }

    #[test]
    fn test_strict_adjustment_cannot_go_negative() {
        let mut a = account(PaymentPreference::Coupon);
        a.paid_bootles_for12 = 1;
        let adj = LedgerAdjustment {
            bottles12: -2,
            ..Default::default()
        };
        assert!(apply_adjustment(&mut a, &adj, FundsPolicy::Strict).is_err());
        assert_eq!(a.paid_bootles_for12, 1);

        let adj = LedgerAdjustment {
            balance: 300.0,
            bottles19: 5,
            ..Default::default()
        };
        apply_adjustment(&mut a, &adj, FundsPolicy::Strict).unwrap();
        assert_eq!(a.balance, 300.0);
        assert_eq!(a.paid_bootles, 6);
    }

    #[test]
    fn test_funds_policy_from_str() {
        assert_eq!("Strict".parse::<FundsPolicy>().unwrap(), FundsPolicy::Strict);
        assert_eq!("lenient".parse::<FundsPolicy>().unwrap(), FundsPolicy::Lenient);
        assert!("loose".parse::<FundsPolicy>().is_err());
    }
}
