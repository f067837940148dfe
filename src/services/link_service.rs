use crate::config::{ArtifactConfig, Config, LinkConfig, RegistrationConfig};
use crate::entities::identity_entity as identities;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::ReferralGraph;
use crate::utils::*;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

/// Unique-link access, regeneration and administration.
#[derive(Clone)]
pub struct LinkService {
    pool: DatabaseConnection,
    graph: ReferralGraph,
    links: LinkConfig,
    artifact_config: ArtifactConfig,
    registration: RegistrationConfig,
}

impl LinkService {
    pub fn new(pool: DatabaseConnection, config: &Config) -> Self {
        Self {
            graph: ReferralGraph::new(pool.clone()),
            pool,
            links: config.links.clone(),
            artifact_config: config.artifacts.clone(),
            registration: config.registration,
        }
    }

    pub async fn access_by_token(&self, token: &str) -> AppResult<IdentityResponse> {
        let identity = self.record_access_at(token, Utc::now()).await?;
        Ok(IdentityResponse::build(
            identity,
            &self.links,
            &self.artifact_config,
        ))
    }

    /// Counts one visit of the link. Inactive and expired links are refused
    /// and their counter is left alone.
    pub async fn record_access_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<identities::Model> {
        let identity = self.find_by_token(token).await?;
        LinkState::evaluate(identity.link_active, identity.link_expires_at, now)
            .ensure_accessible()?;

        let result = identities::Entity::update_many()
            .col_expr(
                identities::Column::LinkClickCount,
                Expr::col(identities::Column::LinkClickCount).add(1),
            )
            .filter(identities::Column::Id.eq(identity.id))
            .filter(identities::Column::LinkToken.eq(token))
            .exec(&self.pool)
            .await?;
        // regenerated between the read and the increment
        if result.rows_affected == 0 {
            return Err(AppError::LinkNotFound);
        }

        identities::Entity::find_by_id(identity.id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::LinkNotFound)
    }

    async fn find_by_token(&self, token: &str) -> AppResult<identities::Model> {
        identities::Entity::find()
            .filter(identities::Column::LinkToken.eq(token))
            .one(&self.pool)
            .await?
            .ok_or(AppError::LinkNotFound)
    }

    /// Issues a fresh token and resets the click counter. Active flag and
    /// expiry are kept.
    pub async fn regenerate_link(&self, uuid: Uuid) -> AppResult<RegenerateLinkResponse> {
        let identity = self.graph.find_by_uuid(uuid).await?;
        let identity_id = identity.id;

        let identity = retry_on_collision(
            self.registration.max_allocation_attempts,
            "link regeneration",
            |_| self.replace_token(identity_id),
        )
        .await?;

        log::info!("Regenerated unique link for identity {}", identity.uuid);

        Ok(RegenerateLinkResponse {
            unique_link: self.links.unique_link(&identity.link_token),
            link_token: identity.link_token,
            link_created_at: identity.link_created_at,
        })
    }

    async fn replace_token(&self, identity_id: i64) -> AppResult<identities::Model> {
        let token = issue_link_token();
        let taken = identities::Entity::find()
            .filter(identities::Column::LinkToken.eq(token.as_str()))
            .count(&self.pool)
            .await?
            > 0;
        if taken {
            return Err(AppError::AllocationCollision("link_token".to_string()));
        }

        identities::Entity::update_many()
            .col_expr(identities::Column::LinkToken, Expr::value(token))
            .col_expr(identities::Column::LinkCreatedAt, Expr::value(Utc::now()))
            .col_expr(identities::Column::LinkClickCount, Expr::value(0i64))
            .filter(identities::Column::Id.eq(identity_id))
            .exec(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        identities::Entity::find_by_id(identity_id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::IdentityNotFound)
    }

    pub async fn update_link(
        &self,
        uuid: Uuid,
        request: UpdateLinkRequest,
    ) -> AppResult<LinkStatusResponse> {
        if request.link_active.is_none() && request.link_expires_at.is_none() && !request.clear_expiry
        {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let identity = self.graph.find_by_uuid(uuid).await?;
        let mut model = identity.into_active_model();
        if let Some(active) = request.link_active {
            model.link_active = Set(active);
        }
        if request.clear_expiry {
            model.link_expires_at = Set(None);
        } else if let Some(expires_at) = request.link_expires_at {
            model.link_expires_at = Set(Some(expires_at));
        }
        let identity = model.update(&self.pool).await?;

        log::info!(
            "Link of identity {} updated: active={}, expires_at={:?}",
            identity.uuid,
            identity.link_active,
            identity.link_expires_at
        );

        Ok(LinkStatusResponse {
            state: LinkState::evaluate(identity.link_active, identity.link_expires_at, Utc::now()),
            link_token: identity.link_token,
            link_active: identity.link_active,
            link_expires_at: identity.link_expires_at,
            link_click_count: identity.link_click_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_identity, setup_db, test_config};
    use chrono::{Duration, TimeZone};

    async fn setup() -> (LinkService, identities::Model) {
        let pool = setup_db().await;
        let identity = seed_identity(&pool, "John", "JOHN000", None, Utc::now()).await;
        (LinkService::new(pool, &test_config()), identity)
    }

    #[tokio::test]
    async fn test_access_counts_clicks_until_deactivated() {
        let (svc, identity) = setup().await;

        svc.access_by_token(&identity.link_token).await.unwrap();
        let second = svc.access_by_token(&identity.link_token).await.unwrap();
        assert_eq!(second.link_click_count, 2);

        let status = svc
            .update_link(
                identity.uuid,
                UpdateLinkRequest {
                    link_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(status.state, LinkState::Inactive);

        let err = svc.access_by_token(&identity.link_token).await.unwrap_err();
        assert!(matches!(err, AppError::LinkInactive));

        let stored = svc.graph.find_by_uuid(identity.uuid).await.unwrap();
        assert_eq!(stored.link_click_count, 2);
    }

    #[tokio::test]
    async fn test_expired_link_is_refused_without_counting() {
        let (svc, identity) = setup().await;
        // whole seconds so the stored value compares exactly
        let expires_at = Utc
            .timestamp_opt(Utc::now().timestamp() + 3600, 0)
            .unwrap();
        svc.update_link(
            identity.uuid,
            UpdateLinkRequest {
                link_expires_at: Some(expires_at),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let ok = svc
            .record_access_at(&identity.link_token, expires_at)
            .await
            .unwrap();
        assert_eq!(ok.link_click_count, 1);

        let later = expires_at + Duration::seconds(1);
        let err = svc
            .record_access_at(&identity.link_token, later)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LinkExpired));

        let stored = svc.graph.find_by_uuid(identity.uuid).await.unwrap();
        assert_eq!(stored.link_click_count, 1);
    }

    #[tokio::test]
    async fn test_inactive_is_reported_before_expired() {
        let (svc, identity) = setup().await;
        svc.update_link(
            identity.uuid,
            UpdateLinkRequest {
                link_active: Some(false),
                link_expires_at: Some(Utc::now() - Duration::days(1)),
                clear_expiry: false,
            },
        )
        .await
        .unwrap();

        let err = svc.access_by_token(&identity.link_token).await.unwrap_err();
        assert!(matches!(err, AppError::LinkInactive));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let (svc, _) = setup().await;
        let err = svc.access_by_token("doesnotexist").await.unwrap_err();
        assert!(matches!(err, AppError::LinkNotFound));
    }

    #[tokio::test]
    async fn test_regenerate_resets_clicks_and_keeps_settings() {
        let (svc, identity) = setup().await;
        svc.access_by_token(&identity.link_token).await.unwrap();
        svc.access_by_token(&identity.link_token).await.unwrap();
        let expires_at = Utc::now() + Duration::days(3);
        svc.update_link(
            identity.uuid,
            UpdateLinkRequest {
                link_expires_at: Some(expires_at),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let regenerated = svc.regenerate_link(identity.uuid).await.unwrap();
        assert_ne!(regenerated.link_token, identity.link_token);
        assert_eq!(regenerated.link_token.len(), LINK_TOKEN_LEN);
        assert!(regenerated.unique_link.ends_with(&format!("/api/v1/links/{}/", regenerated.link_token)));

        let stored = svc.graph.find_by_uuid(identity.uuid).await.unwrap();
        assert_eq!(stored.link_click_count, 0);
        assert!(stored.link_active);
        assert!(stored.link_expires_at.is_some());
        assert!(stored.link_created_at >= identity.link_created_at);

        // the old token no longer resolves
        let err = svc.access_by_token(&identity.link_token).await.unwrap_err();
        assert!(matches!(err, AppError::LinkNotFound));
        let fresh = svc.access_by_token(&regenerated.link_token).await.unwrap();
        assert_eq!(fresh.link_click_count, 1);
    }

    #[tokio::test]
    async fn test_update_link_clear_expiry_and_empty_request() {
        let (svc, identity) = setup().await;
        let err = svc
            .update_link(identity.uuid, UpdateLinkRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        svc.update_link(
            identity.uuid,
            UpdateLinkRequest {
                link_expires_at: Some(Utc::now() - Duration::days(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let status = svc
            .update_link(
                identity.uuid,
                UpdateLinkRequest {
                    link_expires_at: Some(Utc::now() - Duration::days(2)),
                    clear_expiry: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(status.link_expires_at, None);
        assert_eq!(status.state, LinkState::Active);

        let err = svc
            .update_link(
                Uuid::new_v4(),
                UpdateLinkRequest {
                    link_active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IdentityNotFound));
    }
}
