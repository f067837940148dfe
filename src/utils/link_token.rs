use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const LINK_TOKEN_LEN: usize = 32;

/// Random 32-character token over `[A-Za-z0-9]`.
///
/// Unguessability rests on entropy alone; this is not a signed or keyed token.
pub fn issue_link_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(LINK_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// State of a link as seen at access time. Nothing is stored; expiry is derived
/// from the clock on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Active,
    Expired,
    Inactive,
}

impl LinkState {
    /// Inactive takes precedence over expired.
    pub fn evaluate(active: bool, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        if !active {
            return LinkState::Inactive;
        }
        match expires_at {
            Some(expires_at) if now > expires_at => LinkState::Expired,
            _ => LinkState::Active,
        }
    }

    pub fn ensure_accessible(self) -> AppResult<()> {
        match self {
            LinkState::Active => Ok(()),
            LinkState::Expired => Err(AppError::LinkExpired),
            LinkState::Inactive => Err(AppError::LinkInactive),
        }
    }
}
