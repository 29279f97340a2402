//! Pre-submission funds check
//!
//! The server may run with a lenient funds policy, so the app checks the
//! client's balance or bottle credits itself before placing an order.

use shared::ledger::{AppliedCharge, FundsPolicy, LedgerError, order_sum, plan_charge};
use shared::request::PlaceOrderRequest;

use crate::ClientAccount;

/// What placing `req` would debit from `account`, or why it cannot be paid
pub fn check_funds(account: &ClientAccount, req: &PlaceOrderRequest) -> Result<AppliedCharge, LedgerError> {
    let sum = order_sum(&req.products, account.price12, account.price19);
    plan_charge(account, req.op_form, &req.products, sum, FundsPolicy::Strict)
}
