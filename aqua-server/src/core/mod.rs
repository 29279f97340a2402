//! Core module: configuration, shared state, server lifecycle
//!
//! - [`Config`] - settings from the environment
//! - [`ServerState`] - shared service handles
//! - [`Server`] - HTTP server
//! - [`BackgroundTasks`] - push dispatch and housekeeping loops
//! - [`ServerError`] - startup and serving failures

pub mod config;
pub mod error;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::{Config, ConfigError, OtpConfig, PaymentConfig};
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::{Integrations, ServerState};
pub use tasks::{BackgroundTasks, TaskKind};
