//! Client accounts: registration, profile, address book

pub mod otp;
pub mod registration;
pub mod service;

pub use otp::{CodeStore, OtpError};
pub use registration::RegistrationService;
pub use service::ClientService;
