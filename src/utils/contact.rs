use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{7,14}$").expect("valid phone regex"));

/// Basic shape check, deliverability is not verified.
pub fn validate_email(email: &str) -> AppResult<()> {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return Err(AppError::ValidationError(
            "Enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

/// Digits with an optional leading `+`, at most 15 characters.
pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !PHONE_RE.is_match(phone) {
        return Err(AppError::ValidationError(
            "Phone number must be 7-14 digits with an optional leading +".to_string(),
        ));
    }
    Ok(())
}

/// Drops spaces, dashes, dots and parentheses, keeps a leading `+`.
pub fn normalize_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if trimmed.starts_with('+') {
        format!("+{digits}")
    } else if trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || " -.()".contains(c))
    {
        digits
    } else {
        trimmed.to_string()
    }
}
