use crate::error::{AppError, AppResult};
use bcrypt::{DEFAULT_COST, hash};

/// Checks the password and its confirmation entry.
pub fn validate_password(password: &str, reenter_password: &str) -> AppResult<()> {
    if password.is_empty() || reenter_password.is_empty() {
        return Err(AppError::ValidationError(
            "Both password and reenter_password are required".to_string(),
        ));
    }
    if password.len() > 128 {
        return Err(AppError::ValidationError(
            "Password must be at most 128 characters".to_string(),
        ));
    }
    if password != reenter_password {
        return Err(AppError::PasswordMismatch);
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}
