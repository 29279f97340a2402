//! Aqua Server - water-delivery backend
//!
//! # Overview
//!
//! - **Ledger** (`ledger`): balance and bottle-credit settlement with
//!   idempotency records
//! - **Orders** (`orders`): order lifecycle state machine, event broadcast
//! - **Payments** (`payment`): card gateway bridge for balance top-ups
//! - **Clients** (`clients`): confirmation codes, profile, address book
//! - **Notify** (`notify`): mail and push seams
//! - **Storage** (`db`): embedded redb
//! - **HTTP API** (`api`): axum routes
//!
//! # Layout
//!
//! ```text
//! aqua-server/src/
//! ├── core/          # config, state, server, background tasks
//! ├── api/           # HTTP routes and handlers
//! ├── clients/       # OTP code store, registration, profile
//! ├── ledger/        # settlement ledger
//! ├── orders/        # order lifecycle manager
//! ├── payment/       # gateway, callback, payment service
//! ├── notify/        # mailer, push dispatcher
//! ├── utils/         # errors, logging, validation
//! └── db/            # redb storage
//! ```

pub mod api;
pub mod clients;
pub mod core;
pub mod db;
pub mod ledger;
pub mod notify;
pub mod orders;
pub mod payment;
pub mod utils;

pub use core::{Config, Integrations, Server, ServerState};
pub use ledger::LedgerService;
pub use orders::OrdersManager;
pub use payment::{PaymentGateway, PaymentService};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// Start logging as configured (JSON outside development)
pub fn setup_environment(config: &Config) -> anyhow::Result<()> {
    init_logger_with_file(
        &config.log_level,
        !config.is_development(),
        config.log_dir.as_deref(),
    )
}
