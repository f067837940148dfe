use crate::config::{ArtifactConfig, LinkConfig};
use crate::entities::{Gender, identity_entity as identities};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "John")]
    pub display_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@example.com")]
    pub email: String,
    #[schema(example = "+12345678901")]
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    #[schema(example = "Password123")]
    pub password: String,
    #[schema(example = "Password123")]
    pub reenter_password: String,
    /// Referral code of the inviting identity, blank is treated as absent
    #[schema(example = "JANE000")]
    pub referred_by_code: Option<String>,
}

/// Full view of an identity, returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityResponse {
    pub uuid: Uuid,
    pub display_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub referral_code: String,
    pub referral_link: String,
    pub unique_link: String,
    pub qr_code_url: Option<String>,
    pub link_token: String,
    pub link_created_at: DateTime<Utc>,
    pub link_expires_at: Option<DateTime<Utc>>,
    pub link_click_count: i64,
    pub link_active: bool,
    pub created_at: DateTime<Utc>,
}

impl IdentityResponse {
    pub fn build(m: identities::Model, links: &LinkConfig, artifacts: &ArtifactConfig) -> Self {
        let qr_code_url = m.artifact_ref.as_ref().map(|_| {
            format!(
                "{}/{}/qr-code",
                artifacts.public_path.trim_end_matches('/'),
                m.uuid
            )
        });
        Self {
            uuid: m.uuid,
            referral_link: links.referral_link(&m.referral_code),
            unique_link: links.unique_link(&m.link_token),
            qr_code_url,
            display_name: m.display_name,
            last_name: m.last_name,
            email: m.email,
            phone: m.phone,
            gender: m.gender,
            referral_code: m.referral_code,
            link_token: m.link_token,
            link_created_at: m.link_created_at,
            link_expires_at: m.link_expires_at,
            link_click_count: m.link_click_count,
            link_active: m.link_active,
            created_at: m.created_at,
        }
    }
}

/// What anyone holding a referral code may see about its owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferrerResponse {
    pub display_name: String,
    pub referral_code: String,
    pub referral_link: String,
}

impl ReferrerResponse {
    pub fn build(m: identities::Model, links: &LinkConfig) -> Self {
        Self {
            referral_link: links.referral_link(&m.referral_code),
            display_name: m.display_name,
            referral_code: m.referral_code,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdentityListQuery {
    /// Page number, starting at 1
    pub page: Option<String>,
    /// Page size, capped by the configured maximum
    pub limit: Option<String>,
}
