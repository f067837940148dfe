use crate::utils::LinkState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegenerateLinkResponse {
    pub link_token: String,
    pub unique_link: String,
    pub link_created_at: DateTime<Utc>,
}

/// Administrative link settings. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateLinkRequest {
    pub link_active: Option<bool>,
    pub link_expires_at: Option<DateTime<Utc>>,
    /// Removes the expiry; wins over `link_expires_at`
    #[serde(default)]
    pub clear_expiry: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LinkStatusResponse {
    pub link_token: String,
    pub link_active: bool,
    pub link_expires_at: Option<DateTime<Utc>>,
    pub link_click_count: i64,
    pub state: LinkState,
}
