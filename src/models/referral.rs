use crate::entities::identity_entity as identities;
use crate::utils::{MonthlyCount, PaginationInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReferralListQuery {
    /// Case-insensitive match on display name, last name or email
    pub search: Option<String>,
    /// One of `created_at`, `display_name`, `email`, optionally prefixed with `-`
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralSortField {
    CreatedAt,
    DisplayName,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferralSort {
    pub field: ReferralSortField,
    pub descending: bool,
}

impl Default for ReferralSort {
    fn default() -> Self {
        Self {
            field: ReferralSortField::CreatedAt,
            descending: true,
        }
    }
}

impl ReferralSort {
    /// Unknown keys fall back to newest first without an error.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return Self::default();
        };
        let (descending, key) = match raw.strip_prefix('-') {
            Some(key) => (true, key),
            None => (false, raw),
        };
        let field = match key {
            "created_at" => ReferralSortField::CreatedAt,
            "display_name" => ReferralSortField::DisplayName,
            "email" => ReferralSortField::Email,
            _ => return Self::default(),
        };
        Self { field, descending }
    }
}

/// One referred identity as listed on the referrer's dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralItem {
    pub uuid: Uuid,
    pub display_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub referral_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<identities::Model> for ReferralItem {
    fn from(m: identities::Model) -> Self {
        Self {
            uuid: m.uuid,
            display_name: m.display_name,
            last_name: m.last_name,
            email: m.email,
            phone: m.phone,
            referral_code: m.referral_code,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralStats {
    pub total_referrals: u64,
    pub today: u64,
    pub yesterday: u64,
    pub last_7_days: u64,
    pub last_30_days: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralAnalytics {
    pub referral_stats: ReferralStats,
    pub monthly_breakdown: Vec<MonthlyCount>,
    pub recent_referrals: Vec<ReferralItem>,
}

/// OpenAPI shape of a paginated referral listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReferralListResponse {
    pub code: u16,
    pub message: String,
    pub data: Vec<ReferralItem>,
    pub pagination: PaginationInfo,
}
