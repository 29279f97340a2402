//! Input validation helpers
//!
//! Text length limits and field checks shared by the HTTP handlers and the
//! order manager.

use chrono::NaiveDate;
use validator::ValidateEmail;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Names: client full name, address label
pub const MAX_NAME_LEN: usize = 200;

/// Comments, cancellation reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Phone numbers, courier references
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Street lines
pub const MAX_ADDRESS_LEN: usize = 500;

/// Map links
pub const MAX_URL_LEN: usize = 2048;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")).with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that a possibly empty string is within the length limit.
pub fn validate_text_len(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    match value {
        Some(v) => validate_text_len(v, field, max_len),
        None => Ok(()),
    }
}

/// Validate an email address
pub fn validate_email(mail: &str) -> Result<(), AppError> {
    validate_required_text(mail, "mail", MAX_EMAIL_LEN)?;
    if !mail.trim().validate_email() {
        return Err(AppError::validation(format!("Invalid email address: {mail}")).with_detail("field", "mail"));
    }
    Ok(())
}

/// Parse a delivery date (`YYYY-MM-DD`)
pub fn parse_delivery_date(date: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        AppError::validation(format!("Invalid date format: {date}, expected YYYY-MM-DD"))
            .with_detail("field", "date")
    })
}

/// Validate a monetary amount coming from a request
pub fn validate_amount(amount: f64, field: &str) -> Result<(), AppError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(
            AppError::with_message(shared::ErrorCode::ValueOutOfRange, format!("{field} must be a positive number"))
                .with_detail("field", field),
        );
    }
    Ok(())
}
