use crate::error::{AppError, AppResult};
use sea_orm::{DbErr, SqlErr};
use std::future::Future;

/// Runs `op` until it stops failing with [`AppError::AllocationCollision`].
///
/// Each attempt is expected to re-read whatever it allocates from. Once
/// `max_attempts` collisions have happened the collision surfaces as
/// [`AppError::Conflict`].
pub async fn retry_on_collision<T, F, Fut>(max_attempts: u32, what: &str, mut op: F) -> AppResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let attempts = max_attempts.max(1);
    for attempt in 1..=attempts {
        match op(attempt).await {
            Err(AppError::AllocationCollision(column)) => {
                log::warn!("{what}: {column} collided (attempt {attempt}/{attempts})");
            }
            other => return other,
        }
    }
    Err(AppError::Conflict(format!(
        "{what}: no unique value after {attempts} attempts"
    )))
}

/// Translates a unique-index violation into the matching application error.
/// Generated columns become retryable collisions, contact columns duplicates.
pub fn map_unique_violation(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            if detail.contains("email") {
                AppError::DuplicateContact("Email".to_string())
            } else if detail.contains("phone") {
                AppError::DuplicateContact("Phone number".to_string())
            } else if detail.contains("referral_code") {
                AppError::AllocationCollision("referral_code".to_string())
            } else if detail.contains("link_token") {
                AppError::AllocationCollision("link_token".to_string())
            } else if detail.contains("uuid") {
                AppError::AllocationCollision("uuid".to_string())
            } else {
                AppError::Conflict(detail)
            }
        }
        _ => AppError::DatabaseError(err),
    }
}
