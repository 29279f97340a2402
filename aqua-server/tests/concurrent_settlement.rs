//! Concurrent settlement against an on-disk database
//!
//! Many placements and cancellations for one client race on blocking
//! threads; the final balance must equal the sum of the applied charges.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use aqua_server::db::Storage;
use aqua_server::notify::LogPushSender;
use aqua_server::{Config, Integrations, ServerState};
use common::{AcceptingGateway, CapturingMailer};
use rand::Rng;
use shared::ledger::LedgerAdjustment;
use shared::order::{AddressSnapshot, DeliveryDate, OpForm, Products};
use shared::request::PlaceOrderRequest;

const MAIL: &str = "bulk@mail.kz";
const ORDER_COUNT: usize = 40;
const SEED_BALANCE: f64 = 1_000_000.0;

fn open_state(dir: &tempfile::TempDir, mailer: Arc<CapturingMailer>) -> ServerState {
    let mut config = Config::default();
    config.min_mobile_bottles = 1;
    let storage = Storage::open(dir.path().join("aqua.redb")).unwrap();
    let integrations = Integrations {
        gateway: Arc::new(AcceptingGateway),
        mailer,
        push: Arc::new(LogPushSender),
    };
    ServerState::assemble(config, storage, integrations)
}

fn order_request(idx: usize, products: Products) -> PlaceOrderRequest {
    PlaceOrderRequest {
        mail: MAIL.to_string(),
        address: AddressSnapshot {
            actual: format!("Samal-{}", idx % 4),
            ..Default::default()
        },
        products,
        date: DeliveryDate {
            d: format!("2024-07-{:02}", idx / 4 + 1),
            time: "10:00-12:00".to_string(),
        },
        op_form: OpForm::Credit,
        need_call: false,
        comment: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_orders_settle_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let mailer = Arc::new(CapturingMailer::default());

    let expected_balance = {
        let state = open_state(&dir, mailer.clone());
        state.registration.send_code(MAIL).await.unwrap();
        let code = mailer.code_for(MAIL).unwrap();
        let client = state.registration.confirm_code(MAIL, &code).unwrap();
        let seed = LedgerAdjustment {
            balance: SEED_BALANCE,
            ..Default::default()
        };
        state.ledger.adjust(MAIL, "seed", &seed, None).unwrap();

        let mut rng = rand::thread_rng();
        let requests: Vec<_> = (0..ORDER_COUNT)
            .map(|idx| {
                let products = Products {
                    b12: rng.gen_range(0..3),
                    b19: rng.gen_range(1..4),
                };
                order_request(idx, products)
            })
            .collect();

        let placed = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(ORDER_COUNT);
        for req in requests {
            let orders = state.orders.clone();
            let placed = placed.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let order = orders.place_order(req).unwrap();
                placed.fetch_add(1, Ordering::Relaxed);
                order
            }));
        }
        let mut orders = Vec::with_capacity(ORDER_COUNT);
        for handle in handles {
            orders.push(handle.await.unwrap());
        }
        assert_eq!(placed.load(Ordering::Relaxed), ORDER_COUNT);

        // Cancel every other order, twice each, in parallel
        let mut handles = Vec::new();
        for order in orders.iter().step_by(2) {
            for _ in 0..2 {
                let manager = state.orders.clone();
                let id = order.id;
                handles.push(tokio::task::spawn_blocking(move || {
                    manager.cancel_order(id, None).unwrap()
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let kept: f64 = orders.iter().skip(1).step_by(2).map(|o| o.sum).sum();
        let expected = SEED_BALANCE - kept;

        let account = state.storage.find_client_by_email(MAIL).unwrap().unwrap();
        assert_eq!(account.id, client.id);
        assert!((account.balance - expected).abs() < 1e-6);
        assert_eq!(state.orders.active_orders(MAIL).unwrap().len(), ORDER_COUNT / 2);
        expected
    };

    // Everything survives a reopen
    let state = open_state(&dir, mailer);
    let account = state.storage.find_client_by_email(MAIL).unwrap().unwrap();
    assert!((account.balance - expected_balance).abs() < 1e-6);
    assert_eq!(state.orders.active_orders(MAIL).unwrap().len(), ORDER_COUNT / 2);
}
