pub mod identity;
pub mod link;
pub mod referral;

pub use identity::identity_config;
pub use link::link_config;
pub use referral::referral_config;

use crate::error::{AppError, AppResult};
use actix_web::web;
use uuid::Uuid;

/// A path segment that is not a UUID cannot name an identity.
pub(crate) fn parse_identity_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::IdentityNotFound)
}

/// Malformed JSON bodies are reported in the regular failure envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::InvalidInput(format!("Invalid request body: {err}")).into()
    })
}

/// Every route served under `/api/v1`.
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.configure(identity_config)
        .configure(link_config)
        .configure(referral_config);
}
