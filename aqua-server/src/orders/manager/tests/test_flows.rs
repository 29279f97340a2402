use super::*;
use crate::notify::mailer::testing::RecordingMailer;
use std::time::Duration;

#[test]
fn test_repeat_last_order() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Coupon, 0.0, 10, 10);
    manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 1, 1, OpForm::Coupon))
        .unwrap();
    std::thread::sleep(Duration::from_millis(2));
    let last = manager
        .place_order(place_request("a@mail.kz", "Samal-2", "2024-06-02", 0, 3, OpForm::Coupon))
        .unwrap();

    let repeated = manager.repeat_last_order("a@mail.kz", date("2024-06-09")).unwrap();
    assert_ne!(repeated.id, last.id);
    assert_eq!(repeated.address, last.address);
    assert_eq!(repeated.products, last.products);
    assert_eq!(repeated.op_form, OpForm::Coupon);
    assert_eq!(repeated.date.d, "2024-06-09");

    let client = reload_client(&manager, "a@mail.kz");
    assert_eq!(client.paid_bootles_for19, 10 - 1 - 3 - 3);
}

#[test]
fn test_repeat_respects_slot_check() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);
    manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap();

    let err = manager
        .repeat_last_order("a@mail.kz", date("2024-06-01"))
        .unwrap_err();
    assert!(matches!(err, ManagerError::OrderAlreadyExists { .. }));
}

#[test]
fn test_repeat_without_history() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);
    assert!(matches!(
        manager.repeat_last_order("a@mail.kz", date("2024-06-01")),
        Err(ManagerError::NoPreviousOrder(_))
    ));
}

#[test]
fn test_history_and_active_views() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);

    let mut ids = Vec::new();
    for day in 1..=5 {
        let order = manager
            .place_order(place_request(
                "a@mail.kz",
                "Samal-1",
                &format!("2024-06-0{day}"),
                2,
                0,
                OpForm::Fakt,
            ))
            .unwrap();
        ids.push(order.id);
        // Snowflake ids need distinct milliseconds to order reliably
        std::thread::sleep(Duration::from_millis(2));
    }
    manager.cancel_order(ids[0], None).unwrap();
    manager
        .update_order(ids[1], OrderUpdate::Status(OrderStatus::Delivered))
        .unwrap();

    let active = manager.active_orders("A@mail.kz").unwrap();
    assert_eq!(
        active.iter().map(|o| o.id).collect::<Vec<_>>(),
        vec![ids[4], ids[3], ids[2]]
    );

    let page = PaginationQuery {
        page: 1,
        per_page: 2,
    };
    let first = manager.list_client_orders("a@mail.kz", &page).unwrap();
    assert_eq!(first.iter().map(|o| o.id).collect::<Vec<_>>(), vec![ids[4], ids[3]]);

    let page = PaginationQuery {
        page: 3,
        per_page: 2,
    };
    let last = manager.list_client_orders("a@mail.kz", &page).unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].status, OrderStatus::Cancelled);
}

#[test]
fn test_courier_assignment_and_comment() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);
    let order = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap();

    manager
        .update_order(order.id, OrderUpdate::Courier(Some("courier-7".into())))
        .unwrap();
    manager
        .update_order(order.id, OrderUpdate::CourierAggregator(Some("agg-42".into())))
        .unwrap();
    let updated = manager
        .update_order(order.id, OrderUpdate::Comment("Call at the gate".into()))
        .unwrap();

    assert_eq!(updated.courier.as_deref(), Some("courier-7"));
    assert_eq!(updated.courier_aggregator.as_deref(), Some("agg-42"));
    assert_eq!(updated.comment.as_deref(), Some("Call at the gate"));
    assert_eq!(updated.status, OrderStatus::AwaitingOrder);
}

#[test]
fn test_status_cancel_through_update_refunds() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 5000.0, 0, 0);
    let order = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 0, 2, OpForm::Credit))
        .unwrap();
    manager
        .update_order(order.id, OrderUpdate::Status(OrderStatus::OnTheWay))
        .unwrap();
    assert_eq!(reload_client(&manager, "a@mail.kz").balance, 2400.0);

    let cancelled = manager
        .update_order(order.id, OrderUpdate::Status(OrderStatus::Cancelled))
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(reload_client(&manager, "a@mail.kz").balance, 5000.0);
}

#[test]
fn test_delivery_has_no_ledger_effect() {
    let manager = create_test_manager();
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 5000.0, 0, 0);
    let order = manager
        .place_order(place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Credit))
        .unwrap();
    let before = reload_client(&manager, "a@mail.kz");

    for status in [OrderStatus::Confirmed, OrderStatus::Preparing, OrderStatus::OnTheWay, OrderStatus::Delivered] {
        manager.update_order(order.id, OrderUpdate::Status(status)).unwrap();
    }
    assert_eq!(reload_client(&manager, "a@mail.kz"), before);
}

#[tokio::test]
async fn test_admin_mail_for_order_without_coordinates() {
    let mut manager = create_test_manager();
    let mailer = Arc::new(RecordingMailer::default());
    manager.set_admin_notifier(AdminNotifier::new(mailer.clone(), "admin@aqua.kz"));
    seed_client(&manager, "a@mail.kz", PaymentPreference::Balance, 0.0, 0, 0);

    let mut req = place_request("a@mail.kz", "Samal-1", "2024-06-01", 2, 0, OpForm::Fakt);
    req.address.point = None;
    let order = manager.place_order(req).unwrap();
    manager
        .place_order(place_request("a@mail.kz", "Samal-9", "2024-06-01", 2, 0, OpForm::Fakt))
        .unwrap();

    // The mail is sent from a spawned task after place_order returns
    for _ in 0..50 {
        if mailer.count() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(mailer.count(), 1);
    let body = mailer.last_body_for("admin@aqua.kz").unwrap();
    assert!(body.contains("Samal-1"));
    assert!(order.address.point.is_none());
}
