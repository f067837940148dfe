use crate::config::LinkConfig;
use crate::entities::identity_entity as identities;
use crate::error::{AppError, AppResult};
use crate::external::ArtifactStore;
use crate::utils::render_qr_png;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;

/// Generates and stores the QR image that encodes an identity's referral link.
#[derive(Clone)]
pub struct ArtifactService {
    pool: DatabaseConnection,
    store: Arc<dyn ArtifactStore>,
    links: LinkConfig,
}

impl ArtifactService {
    pub fn new(pool: DatabaseConnection, store: Arc<dyn ArtifactStore>, links: LinkConfig) -> Self {
        Self { pool, store, links }
    }

    pub fn artifact_key(referral_code: &str) -> String {
        format!("qr_codes/{referral_code}_qr.png")
    }

    /// Creates the artifact unless the identity already has one.
    ///
    /// Never fails: when rendering or storing goes wrong the identity is
    /// returned unchanged and `artifact_ref` stays empty.
    pub async fn ensure_artifact(&self, mut identity: identities::Model) -> identities::Model {
        if identity.artifact_ref.is_some() {
            return identity;
        }
        match self.generate_and_attach(&identity).await {
            Ok(key) => identity.artifact_ref = Some(key),
            Err(e) => log::warn!(
                "QR code for referral code {} was not stored: {e}",
                identity.referral_code
            ),
        }
        identity
    }

    async fn generate_and_attach(&self, identity: &identities::Model) -> AppResult<String> {
        let url = self.links.referral_link(&identity.referral_code);
        let png = render_qr_png(&url)?;
        let key = self
            .store
            .put(&Self::artifact_key(&identity.referral_code), png)
            .await?;

        identities::Entity::update_many()
            .col_expr(identities::Column::ArtifactRef, Expr::value(key.clone()))
            .filter(identities::Column::Id.eq(identity.id))
            .filter(identities::Column::ArtifactRef.is_null())
            .exec(&self.pool)
            .await?;

        Ok(key)
    }

    pub async fn load(&self, identity: &identities::Model) -> AppResult<Vec<u8>> {
        let key = identity
            .artifact_ref
            .as_deref()
            .ok_or(AppError::ArtifactNotFound)?;
        self.store.get(key).await?.ok_or(AppError::ArtifactNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BrokenArtifactStore, MemoryArtifactStore, seed_identity, setup_db};
    use chrono::Utc;

    #[tokio::test]
    async fn test_ensure_artifact_stores_once() {
        let pool = setup_db().await;
        let store = Arc::new(MemoryArtifactStore::default());
        let service = ArtifactService::new(pool.clone(), store.clone(), LinkConfig::default());
        let identity = seed_identity(&pool, "John", "JOHN000", None, Utc::now()).await;

        let identity = service.ensure_artifact(identity).await;
        assert_eq!(identity.artifact_ref.as_deref(), Some("qr_codes/JOHN000_qr.png"));

        let stored = identities::Entity::find_by_id(identity.id)
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.artifact_ref, identity.artifact_ref);

        let png = service.load(&stored).await.unwrap();
        let expected = render_qr_png("http://localhost:8080/api/v1/refer/JOHN000/").unwrap();
        assert_eq!(png, expected);

        // already present, nothing is rewritten
        store.blobs.lock().await.clear();
        let again = service.ensure_artifact(stored).await;
        assert!(again.artifact_ref.is_some());
        assert!(store.blobs.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_leaves_reference_unset() {
        let pool = setup_db().await;
        let service = ArtifactService::new(
            pool.clone(),
            Arc::new(BrokenArtifactStore),
            LinkConfig::default(),
        );
        let identity = seed_identity(&pool, "John", "JOHN000", None, Utc::now()).await;

        let identity = service.ensure_artifact(identity).await;
        assert!(identity.artifact_ref.is_none());
        assert!(matches!(
            service.load(&identity).await,
            Err(AppError::ArtifactNotFound)
        ));
    }
}
