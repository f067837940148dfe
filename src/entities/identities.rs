use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(10))")]
pub enum Gender {
    #[sea_orm(string_value = "Male")]
    Male,
    #[sea_orm(string_value = "Female")]
    Female,
}

/// Registered identity.
/// - `referral_code` is assigned once at registration and never changes
/// - `referred_by` points at the referrer's row id, which always existed before this row
/// - `artifact_ref` stays empty when the QR image could not be stored
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "identities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub uuid: Uuid,
    pub display_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub password_hash: String,
    #[sea_orm(unique)]
    pub referral_code: String,
    pub referred_by: Option<i64>,
    #[sea_orm(unique)]
    pub link_token: String,
    pub link_created_at: DateTime<Utc>,
    pub link_expires_at: Option<DateTime<Utc>>,
    pub link_click_count: i64,
    pub link_active: bool,
    pub artifact_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ReferredBy",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Referrer,
}

impl ActiveModelBehavior for ActiveModel {}
