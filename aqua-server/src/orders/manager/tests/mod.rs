use super::*;
use shared::FundsPolicy;
use shared::models::{GeoPoint, PaymentPreference};
use shared::order::{AddressSnapshot, DeliveryDate, OpForm, Products};

fn create_test_manager() -> OrdersManager {
    create_test_manager_with(FundsPolicy::Strict, OrderRules::default())
}

/// Staff-side placement: single-bottle orders allowed
fn create_staff_manager() -> OrdersManager {
    create_test_manager_with(FundsPolicy::Strict, OrderRules { min_bottles: 1 })
}

fn create_test_manager_with(policy: FundsPolicy, rules: OrderRules) -> OrdersManager {
    let storage = Storage::open_in_memory().unwrap();
    let ledger = LedgerService::new(storage.clone(), policy, 50);
    OrdersManager::new(storage, ledger, rules)
}

// ========================================================================
// Helper: seed a client
// ========================================================================

fn seed_client(
    manager: &OrdersManager,
    mail: &str,
    preference: PaymentPreference,
    balance: f64,
    bottles12: i64,
    bottles19: i64,
) -> ClientAccount {
    let mut client = ClientAccount::new(snowflake_id(), mail.to_string(), 900.0, 1300.0, 0);
    client.payment_preference = preference;
    client.balance = balance;
    client.paid_bootles_for12 = bottles12;
    client.paid_bootles_for19 = bottles19;
    client.sync_legacy_bottles();

    let storage = manager.storage();
    let txn = storage.begin_write().unwrap();
    storage.put_client(&txn, &client).unwrap();
    txn.commit().unwrap();
    client
}

fn reload_client(manager: &OrdersManager, mail: &str) -> ClientAccount {
    manager.storage().find_client_by_email(mail).unwrap().unwrap()
}

fn address(actual: &str) -> AddressSnapshot {
    AddressSnapshot {
        actual: actual.to_string(),
        name: "Home".to_string(),
        phone: "+77010000000".to_string(),
        point: Some(GeoPoint {
            lat: 43.23,
            lon: 76.95,
        }),
        link: None,
    }
}

fn date(d: &str) -> DeliveryDate {
    DeliveryDate {
        d: d.to_string(),
        time: "10:00-12:00".to_string(),
    }
}

fn place_request(mail: &str, actual: &str, d: &str, b12: u32, b19: u32, op_form: OpForm) -> PlaceOrderRequest {
    PlaceOrderRequest {
        mail: mail.to_string(),
        address: address(actual),
        products: Products { b12, b19 },
        date: date(d),
        op_form,
        need_call: false,
        comment: None,
    }
}

mod test_boundary;
mod test_flows;
