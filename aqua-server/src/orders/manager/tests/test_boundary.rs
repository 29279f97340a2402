use super::*;
use crate::utils::{AppError, ErrorCode};

#[test]
fn test_minimum_quantity() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 5000.0, 0, 0);

    for (b12, b19) in [(0, 0), (1, 0), (0, 1)] {
        let err = manager
            .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", b12, b19, OpForm::Credit))
            .unwrap_err();
        assert!(matches!(err, ManagerError::InsufficientQuantity { min: 2, .. }));
    }

    // Nothing was charged
    let client = reload_client(&manager, "a@mail.kz");
    assert_eq!(client.balance, 5000.0);
    assert_eq!(client.bonus, 0);
    assert!(manager.active_orders("a@mail.kz").unwrap().is_empty());
}

#[test]
fn test_duplicate_slot_rejected() {
    let manager = create_staff_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 1000.0, 0, 0);
    manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 1, 0, OpForm::Credit))
        .unwrap();

    let err = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 0, 1, OpForm::Fakt))
        .unwrap_err();
    let app: AppError = err.into();
    assert_eq!(app.code, ErrorCode::OrderAlreadyExists);
    assert!(app.message.contains("already exists for this date"));

    // Balance untouched by the rejected attempt
    assert_eq!(reload_client(&manager, "a@mail.kz").balance, 100.0);
}

#[test]
fn test_unpadded_date_hits_same_slot() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);
    manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap();

    let err = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-6-1", 2, 0, OpForm::Fakt))
        .unwrap_err();
    assert!(matches!(err, ManagerError::OrderAlreadyExists { ref date, .. } if date == "2024-06-01"));
    assert_eq!(manager.active_orders("a@mail.kz").unwrap().len(), 1);
}

#[test]
fn test_date_stored_zero_padded() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);
    let order = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-6-1", 2, 0, OpForm::Fakt))
        .unwrap();
    assert_eq!(order.date.d, "2024-06-01");
    assert_eq!(manager.get_order(order.id).unwrap().date.d, "2024-06-01");
}

#[test]
fn test_oversized_order_rejected() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);

    let err = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", u32::MAX, 1, OpForm::Fakt))
        .unwrap_err();
    assert!(matches!(err, ManagerError::TooManyBottles { total: u32::MAX, max: MAX_BOTTLES_PER_ORDER }));
    assert_eq!(AppError::from(err).code, ErrorCode::ValueOutOfRange);

    let err = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", MAX_BOTTLES_PER_ORDER, 1, OpForm::Fakt))
        .unwrap_err();
    assert!(matches!(err, ManagerError::TooManyBottles { .. }));

    assert!(
        manager
            .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", MAX_BOTTLES_PER_ORDER, 0, OpForm::Fakt))
            .is_ok()
    );
}

#[test]
fn test_taken_order_id_is_redrawn() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);
    let existing = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap();

    let mut draws = [existing.id, existing.id + 1].into_iter();
    let storage = manager.storage();
    let txn = storage.begin_write().unwrap();
    let id = manager
        .unused_order_id(&txn, || draws.next().unwrap())
        .unwrap();
    assert_eq!(id, existing.id + 1);
    drop(txn);

    // The stored order is untouched
    assert_eq!(manager.get_order(existing.id).unwrap(), existing);
}

#[test]
fn test_same_date_other_address_allowed() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);
    manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap();
    manager
        .place_order(place_request("a@mail.kz", "Samal-2", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap();
    manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-02", 2, 0, OpForm::Fakt))
        .unwrap();
    assert_eq!(manager.active_orders("a@mail.kz").unwrap().len(), 3);
}

#[test]
fn test_address_whitespace_does_not_bypass_slot_check() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);
    manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap();
    let err = manager
        .place_order(place_request("a@mail.kz", "  Samal-1 ", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap_err();
    assert!(matches!(err, ManagerError::OrderAlreadyExists { .. }));
}

#[test]
fn test_slot_reusable_after_cancel() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);
    let first = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap();
    manager.cancel_order(first.id, None).unwrap();

    assert!(
        manager
            .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt))
            .is_ok()
    );
}

#[test]
fn test_strict_policy_rejects_without_side_effects() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 100.0, 0, 0);

    let err = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Credit))
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::InsufficientFunds);

    let client = reload_client(&manager, "a@mail.kz");
    assert_eq!(client.balance, 100.0);
    assert_eq!(client.bonus, 0);
    assert!(manager.active_orders("a@mail.kz").unwrap().is_empty());
}

#[test]
fn test_lenient_policy_allows_overdraft() {
    let manager = create_test_manager_with(FundsPolicy::Lenient, OrderRules::default());
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 100.0, 0, 0);
    let order = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Credit))
        .unwrap();
    assert_eq!(reload_client(&manager, "a@mail.kz").balance, -1700.0);

    manager.cancel_order(order.id, None).unwrap();
    assert_eq!(reload_client(&manager, "a@mail.kz").balance, 100.0);
}

#[test]
fn test_lenient_coupon_skips_empty_counter_and_refund_matches() {
    let manager = create_test_manager_with(FundsPolicy::Lenient, OrderRules::default());
    seed_client(&manager, "c@mail.kz", PaymentPreference::Coupon, 0.0, 0, 5);
    let order = manager
        .place_order(place_request("c@mail.kz", "Samal-1", "2024-06-01", 2, 2, OpForm::Coupon))
        .unwrap();
    let charge = order.applied_charge.unwrap();
    assert_eq!(charge.bottles12, 0);
    assert_eq!(charge.bottles19, 2);

    manager.cancel_order(order.id, None).unwrap();
    let client = reload_client(&manager, "c@mail.kz");
    assert_eq!(client.paid_bootles_for12, 0);
    assert_eq!(client.paid_bootles_for19, 5);
}

#[test]
fn test_payment_method_must_match_preference() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 5000.0, 5, 5);
    let err = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 1, 1, OpForm::Coupon))
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::PaymentMethodMismatch);
}

#[test]
fn test_unknown_client() {
    let manager = create_test_manager();
    let err = manager
        .place_order(place_request("ghost@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap_err();
    assert!(matches!(err, ManagerError::ClientNotFound(_)));
}

#[test]
fn test_invalid_input_rejected() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);

    let mut bad_date = place_request("a@mail.kz", "Samal-1", "01.06.2024", 2, 0, OpForm::Fakt);
    assert!(matches!(manager.place_order(bad_date.clone()), Err(ManagerError::Rejected(_))));

    bad_date.date.d = "2024-06-01".into();
    bad_date.address.actual = "   ".into();
    assert!(matches!(manager.place_order(bad_date), Err(ManagerError::Rejected(_))));
}

#[test]
fn test_cancel_twice_refunds_once() {
    let manager = create_staff_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 1000.0, 0, 0);
    let order = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 1, 0, OpForm::Credit))
        .unwrap();

    let first = manager.cancel_order(order.id, Some("first".into())).unwrap();
    let after_first = reload_client(&manager, "a@mail.kz");
    let second = manager.cancel_order(order.id, Some("second".into())).unwrap();
    let after_second = reload_client(&manager, "a@mail.kz");

    assert_eq!(after_first, after_second);
    assert_eq!(after_second.balance, 1000.0);
    // The second call is a no-op on the order too
    assert_eq!(first, second);
    assert_eq!(second.reason.as_deref(), Some("first"));
}

#[test]
fn test_cannot_cancel_delivered() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);
    let order = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap();
    manager
        .update_order(order.id, OrderUpdate::Status(OrderStatus::Delivered))
        .unwrap();

    let err = manager.cancel_order(order.id, None).unwrap_err();
    assert!(matches!(err, ManagerError::OrderAlreadyDelivered(_)));
}

#[test]
fn test_no_backwards_status_moves() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);
    let order = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap();
    manager
        .update_order(order.id, OrderUpdate::Status(OrderStatus::OnTheWay))
        .unwrap();

    let err = manager
        .update_order(order.id, OrderUpdate::Status(OrderStatus::Confirmed))
        .unwrap_err();
    assert!(matches!(err, ManagerError::InvalidTransition { .. }));
}
