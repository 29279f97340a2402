//! Server configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `WORK_DIR` | `/var/lib/aqua` | Working directory (database lives under `database/`) |
//! | `HTTP_PORT` | `3000` | HTTP listen port |
//! | `ENVIRONMENT` | `development` | `development` / `staging` / `production` |
//! | `LOG_LEVEL` | `info` | Default tracing level (`RUST_LOG` wins when set) |
//! | `LOG_DIR` | - | Enables daily rolling log files |
//! | `REQUEST_TIMEOUT_MS` | `30000` | Per-request timeout |
//! | `LEDGER_FUNDS_POLICY` | `strict` | `strict` rejects charges the account cannot cover, `lenient` debits anyway |
//! | `ORDER_BONUS` | `50` | Loyalty points per placed order |
//! | `MIN_MOBILE_BOTTLES` | `2` | Minimum `b12 + b19` for client-placed orders |
//! | `DEFAULT_PRICE12` | `900` | Unit price of a 12L bottle for new accounts |
//! | `DEFAULT_PRICE19` | `1300` | Unit price of a 19L bottle for new accounts |
//! | `PAYMENT_GATEWAY_URL` | `https://pay.example.kz/api` | Card gateway base URL |
//! | `PAYMENT_MERCHANT_ID` | `aqua-dev` | Merchant id sent with gateway requests |
//! | `PAYMENT_SECRET_KEY` | required outside development | Signs gateway requests |
//! | `PAYMENT_CALLBACK_SECRET` | required outside development | Verifies gateway callbacks |
//! | `PAYMENT_RETURN_URL` | `https://aqua.example.kz/payment/return` | Redirect after the hosted page |
//! | `OTP_TTL_SECS` | `300` | Confirmation code lifetime |
//! | `OTP_COOLDOWN_SECS` | `60` | Minimum gap between two codes for one email |
//! | `OTP_MAX_ATTEMPTS` | `5` | Wrong guesses before a code is dropped |
//! | `STAFF_TOKEN` | required outside development | Bearer token for staff-only routes |
//! | `ADMIN_EMAIL` | - | Receives mails about orders without coordinates |
//! | `PUSH_ENDPOINT` | - | Expo-compatible push endpoint; pushes are only logged when unset |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use shared::FundsPolicy;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in {1} environment")]
    MissingSecret(&'static str, String),

    #[error("{0} must not be empty in {1} environment")]
    EmptySecret(&'static str, String),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub request_timeout_ms: u64,
    pub funds_policy: FundsPolicy,
    pub order_bonus: i64,
    pub min_mobile_bottles: u32,
    pub default_price12: f64,
    pub default_price19: f64,
    pub payment: PaymentConfig,
    pub otp: OtpConfig,
    /// Bearer token for `/api/clients/adjust` and `/api/orders/update`
    pub staff_token: String,
    pub admin_email: Option<String>,
    pub push_endpoint: Option<String>,
}

/// Card gateway settings
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub gateway_url: String,
    pub merchant_id: String,
    pub secret_key: String,
    pub callback_secret: String,
    pub return_url: String,
}

/// Confirmation code settings
#[derive(Debug, Clone, Copy)]
pub struct OtpConfig {
    pub ttl: Duration,
    pub cooldown: Duration,
    pub max_attempts: u32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            cooldown: Duration::from_secs(60),
            max_attempts: 5,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    /// Require a secret: must be set and non-empty outside development
    fn require_secret(name: &'static str, environment: &str) -> Result<String, ConfigError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(ConfigError::MissingSecret(name, environment.to_string()));
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(ConfigError::EmptySecret(name, environment.to_string()));
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let funds_policy = match std::env::var("LEDGER_FUNDS_POLICY") {
            Ok(v) => v
                .parse::<FundsPolicy>()
                .map_err(|e| ConfigError::Invalid("LEDGER_FUNDS_POLICY", e))?,
            Err(_) => FundsPolicy::default(),
        };

        let defaults = Self::default();

        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or(defaults.work_dir),
            http_port: env_or("HTTP_PORT", defaults.http_port),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: env_opt("LOG_DIR"),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
            funds_policy,
            order_bonus: env_or("ORDER_BONUS", defaults.order_bonus),
            min_mobile_bottles: env_or("MIN_MOBILE_BOTTLES", defaults.min_mobile_bottles),
            default_price12: env_or("DEFAULT_PRICE12", defaults.default_price12),
            default_price19: env_or("DEFAULT_PRICE19", defaults.default_price19),
            payment: PaymentConfig {
                gateway_url: std::env::var("PAYMENT_GATEWAY_URL")
                    .unwrap_or(defaults.payment.gateway_url),
                merchant_id: std::env::var("PAYMENT_MERCHANT_ID")
                    .unwrap_or(defaults.payment.merchant_id),
                secret_key: Self::require_secret("PAYMENT_SECRET_KEY", &environment)?,
                callback_secret: Self::require_secret("PAYMENT_CALLBACK_SECRET", &environment)?,
                return_url: std::env::var("PAYMENT_RETURN_URL")
                    .unwrap_or(defaults.payment.return_url),
            },
            otp: OtpConfig {
                ttl: Duration::from_secs(env_or("OTP_TTL_SECS", 300)),
                cooldown: Duration::from_secs(env_or("OTP_COOLDOWN_SECS", 60)),
                max_attempts: env_or("OTP_MAX_ATTEMPTS", defaults.otp.max_attempts),
            },
            staff_token: Self::require_secret("STAFF_TOKEN", &environment)?,
            admin_email: env_opt("ADMIN_EMAIL"),
            push_endpoint: env_opt("PUSH_ENDPOINT"),
            environment,
        })
    }

    /// Config rooted at a specific working directory, everything else default
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Self::default()
        }
    }

    /// `{work_dir}/database`
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// `{work_dir}/database/aqua.redb`
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("aqua.redb")
    }

    /// Create the working directory layout
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: "/var/lib/aqua".into(),
            http_port: 3000,
            environment: "development".into(),
            log_level: "info".into(),
            log_dir: None,
            request_timeout_ms: 30_000,
            funds_policy: FundsPolicy::Strict,
            order_bonus: 50,
            min_mobile_bottles: 2,
            default_price12: 900.0,
            default_price19: 1300.0,
            payment: PaymentConfig {
                gateway_url: "https://pay.example.kz/api".into(),
                merchant_id: "aqua-dev".into(),
                secret_key: "dev-PAYMENT_SECRET_KEY-not-for-production".into(),
                callback_secret: "dev-PAYMENT_CALLBACK_SECRET-not-for-production".into(),
                return_url: "https://aqua.example.kz/payment/return".into(),
            },
            otp: OtpConfig::default(),
            staff_token: "dev-STAFF_TOKEN-not-for-production".into(),
            admin_email: None,
            push_endpoint: None,
        }
    }
}
