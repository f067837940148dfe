use crate::entities::identity_entity as identities;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};
use uuid::Uuid;

/// Referrer -> referred edges, stored as `identities.referred_by`.
///
/// Edges are only ever created while inserting the child and always point at a
/// row that already exists, so the graph stays a forest without cycle checks.
#[derive(Clone)]
pub struct ReferralGraph {
    pool: DatabaseConnection,
}

impl ReferralGraph {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn find_by_uuid(&self, uuid: Uuid) -> AppResult<identities::Model> {
        identities::Entity::find()
            .filter(identities::Column::Uuid.eq(uuid))
            .one(&self.pool)
            .await?
            .ok_or(AppError::IdentityNotFound)
    }

    pub async fn find_by_code(&self, referral_code: &str) -> AppResult<Option<identities::Model>> {
        let identity = identities::Entity::find()
            .filter(identities::Column::ReferralCode.eq(referral_code))
            .one(&self.pool)
            .await?;
        Ok(identity)
    }

    /// Points the not yet inserted `child` at the owner of `parent_code` and
    /// returns that owner.
    pub async fn insert_edge(
        &self,
        parent_code: &str,
        child: &mut identities::ActiveModel,
    ) -> AppResult<identities::Model> {
        let parent = self
            .find_by_code(parent_code)
            .await?
            .ok_or_else(|| AppError::UnknownReferralCode(parent_code.to_string()))?;
        child.referred_by = Set(Some(parent.id));
        Ok(parent)
    }

    /// Unordered query over the direct children of `identity_id`.
    pub fn children(&self, identity_id: i64) -> Select<identities::Entity> {
        identities::Entity::find().filter(identities::Column::ReferredBy.eq(identity_id))
    }

    /// Direct children, newest first.
    pub async fn children_of(
        &self,
        identity_id: i64,
        limit: Option<u64>,
    ) -> AppResult<Vec<identities::Model>> {
        let children = self
            .children(identity_id)
            .order_by_desc(identities::Column::CreatedAt)
            .order_by_desc(identities::Column::Id)
            .limit(limit)
            .all(&self.pool)
            .await?;
        Ok(children)
    }

    pub async fn count_children(&self, identity_id: i64) -> AppResult<u64> {
        let count = self.children(identity_id).count(&self.pool).await?;
        Ok(count)
    }

    /// Children created at or after `cutoff`.
    pub async fn children_since(&self, identity_id: i64, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let count = self
            .children(identity_id)
            .filter(identities::Column::CreatedAt.gte(cutoff))
            .count(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn children_created_at(&self, identity_id: i64) -> AppResult<Vec<DateTime<Utc>>> {
        let stamps: Vec<DateTime<Utc>> = self
            .children(identity_id)
            .select_only()
            .column(identities::Column::CreatedAt)
            .into_tuple()
            .all(&self.pool)
            .await?;
        Ok(stamps)
    }
}
