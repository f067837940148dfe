use crate::config::{ArtifactConfig, Config, LinkConfig, PaginationConfig, RegistrationConfig};
use crate::entities::identity_entity as identities;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{ArtifactService, ReferralGraph};
use crate::utils::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

const MAX_NAME_LEN: usize = 255;

#[derive(Clone)]
pub struct IdentityService {
    pool: DatabaseConnection,
    graph: ReferralGraph,
    artifacts: ArtifactService,
    links: LinkConfig,
    artifact_config: ArtifactConfig,
    pagination: PaginationConfig,
    registration: RegistrationConfig,
}

impl IdentityService {
    pub fn new(pool: DatabaseConnection, artifacts: ArtifactService, config: &Config) -> Self {
        Self {
            graph: ReferralGraph::new(pool.clone()),
            pool,
            artifacts,
            links: config.links.clone(),
            artifact_config: config.artifacts.clone(),
            pagination: config.pagination,
            registration: config.registration,
        }
    }

    /// Validates the request, links the referrer, allocates code and token
    /// and finally attaches the QR artifact.
    ///
    /// Nothing is persisted unless the identity row itself commits; a failing
    /// artifact only leaves `qr_code_url` empty.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<IdentityResponse> {
        let display_name = request.display_name.trim().to_string();
        let last_name = request.last_name.trim().to_string();
        if display_name.is_empty() || last_name.is_empty() {
            return Err(AppError::ValidationError(
                "display_name and last_name are required".to_string(),
            ));
        }
        if display_name.chars().count() > MAX_NAME_LEN || last_name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::ValidationError(format!(
                "Names must be at most {MAX_NAME_LEN} characters"
            )));
        }

        let email = request.email.trim().to_string();
        validate_email(&email)?;

        let phone = request
            .phone
            .as_deref()
            .map(normalize_phone)
            .filter(|p| !p.is_empty());
        if let Some(phone) = &phone {
            validate_phone(phone)?;
        }

        validate_password(&request.password, &request.reenter_password)?;

        self.ensure_contact_available(&email, phone.as_deref()).await?;

        let mut draft = identities::ActiveModel {
            display_name: Set(display_name.clone()),
            last_name: Set(last_name),
            email: Set(email),
            phone: Set(phone),
            gender: Set(request.gender),
            password_hash: Set(hash_password(&request.password)?),
            referred_by: Set(None),
            link_expires_at: Set(None),
            link_click_count: Set(0),
            link_active: Set(true),
            artifact_ref: Set(None),
            ..Default::default()
        };

        if let Some(code) = request
            .referred_by_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            let referrer = self.graph.insert_edge(code, &mut draft).await?;
            log::debug!("Registration referred by identity {}", referrer.uuid);
        }

        let draft = &draft;
        let display_name = display_name.as_str();
        let identity = retry_on_collision(
            self.registration.max_allocation_attempts,
            "identity registration",
            |_| self.insert_identity(display_name, draft),
        )
        .await?;

        log::info!(
            "Registered identity {} with referral code {}",
            identity.uuid,
            identity.referral_code
        );

        let identity = self.artifacts.ensure_artifact(identity).await;
        Ok(self.to_response(identity))
    }

    /// One allocation attempt: re-scans the codes under the name's prefix,
    /// picks the next free one and inserts. Unique-index races come back as
    /// [`AppError::AllocationCollision`].
    async fn insert_identity(
        &self,
        display_name: &str,
        draft: &identities::ActiveModel,
    ) -> AppResult<identities::Model> {
        let model = self.prepare_identity(display_name, draft).await?;
        self.commit_identity(model).await
    }

    /// Fills code, token, uuid and timestamps into a copy of `draft`.
    async fn prepare_identity(
        &self,
        display_name: &str,
        draft: &identities::ActiveModel,
    ) -> AppResult<identities::ActiveModel> {
        let prefix = referral_prefix(display_name);
        let existing: Vec<String> = identities::Entity::find()
            .select_only()
            .column(identities::Column::ReferralCode)
            .filter(identities::Column::ReferralCode.starts_with(prefix.as_str()))
            .into_tuple()
            .all(&self.pool)
            .await?;
        let referral_code = allocate_referral_code(display_name, &existing)?;

        let now = Utc::now();
        let mut model = draft.clone();
        model.uuid = Set(Uuid::new_v4());
        model.referral_code = Set(referral_code);
        model.link_token = Set(issue_link_token());
        model.link_created_at = Set(now);
        model.created_at = Set(now);
        Ok(model)
    }

    async fn commit_identity(
        &self,
        model: identities::ActiveModel,
    ) -> AppResult<identities::Model> {
        model.insert(&self.pool).await.map_err(map_unique_violation)
    }

    async fn ensure_contact_available(&self, email: &str, phone: Option<&str>) -> AppResult<()> {
        let email_taken = identities::Entity::find()
            .filter(identities::Column::Email.eq(email))
            .count(&self.pool)
            .await?
            > 0;
        if email_taken {
            return Err(AppError::DuplicateContact("Email".to_string()));
        }

        if let Some(phone) = phone {
            let phone_taken = identities::Entity::find()
                .filter(identities::Column::Phone.eq(phone))
                .count(&self.pool)
                .await?
                > 0;
            if phone_taken {
                return Err(AppError::DuplicateContact("Phone number".to_string()));
            }
        }

        Ok(())
    }

    pub async fn get_identity(&self, uuid: Uuid) -> AppResult<IdentityResponse> {
        let identity = self.graph.find_by_uuid(uuid).await?;
        Ok(self.to_response(identity))
    }

    /// All identities, newest first.
    pub async fn list_identities(
        &self,
        query: &IdentityListQuery,
    ) -> AppResult<Page<IdentityResponse>> {
        let request = PageRequest::parse(
            query.page.as_deref(),
            query.limit.as_deref(),
            &self.pagination,
        )?;

        let total = identities::Entity::find().count(&self.pool).await?;
        let models = identities::Entity::find()
            .order_by_desc(identities::Column::CreatedAt)
            .order_by_desc(identities::Column::Id)
            .limit(request.limit)
            .offset(request.offset())
            .all(&self.pool)
            .await?;

        Ok(Page::new(models, request, total).map(|m| self.to_response(m)))
    }

    pub async fn resolve_referral_code(&self, referral_code: &str) -> AppResult<ReferrerResponse> {
        let code = referral_code.trim();
        let identity = self
            .graph
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::ReferralCodeNotFound(code.to_string()))?;
        Ok(ReferrerResponse::build(identity, &self.links))
    }

    /// PNG bytes of the identity's QR code, created on first request if the
    /// registration-time attempt did not succeed.
    pub async fn qr_code(&self, uuid: Uuid) -> AppResult<Vec<u8>> {
        let identity = self.graph.find_by_uuid(uuid).await?;
        let identity = self.artifacts.ensure_artifact(identity).await;
        self.artifacts.load(&identity).await
    }

    fn to_response(&self, identity: identities::Model) -> IdentityResponse {
        IdentityResponse::build(identity, &self.links, &self.artifact_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        BrokenArtifactStore, MemoryArtifactStore, seed_identity, setup_db, test_config,
    };
    use std::sync::Arc;

    async fn service_with_store(store: Arc<dyn crate::external::ArtifactStore>) -> IdentityService {
        let pool = setup_db().await;
        let config = test_config();
        let artifacts = ArtifactService::new(pool.clone(), store, config.links.clone());
        IdentityService::new(pool, artifacts, &config)
    }

    async fn service() -> IdentityService {
        service_with_store(Arc::new(MemoryArtifactStore::default())).await
    }

    fn request(display_name: &str, last_name: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            display_name: display_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            phone: None,
            gender: None,
            password: "Password123".to_string(),
            reenter_password: "Password123".to_string(),
            referred_by_code: None,
        }
    }

    #[tokio::test]
    async fn test_register_allocates_sequential_codes() {
        let svc = service().await;

        let john = svc.register(request("John", "Doe", "john@example.com")).await.unwrap();
        assert_eq!(john.referral_code, "JOHN000");
        assert_eq!(john.link_token.len(), LINK_TOKEN_LEN);
        assert_eq!(john.link_click_count, 0);
        assert!(john.link_active);
        assert_eq!(john.referral_link, "http://localhost:8080/api/v1/refer/JOHN000/");
        assert_eq!(
            john.unique_link,
            format!("http://localhost:8080/api/v1/links/{}/", john.link_token)
        );
        assert_eq!(
            john.qr_code_url,
            Some(format!("/api/v1/identities/{}/qr-code", john.uuid))
        );

        let mut smith = request("John", "Smith", "smith@example.com");
        smith.referred_by_code = Some("JOHN000".to_string());
        let smith = svc.register(smith).await.unwrap();
        assert_eq!(smith.referral_code, "JOHN001");
        assert_ne!(smith.link_token, john.link_token);

        let stored = svc.graph.find_by_uuid(smith.uuid).await.unwrap();
        let parent = svc.graph.find_by_uuid(john.uuid).await.unwrap();
        assert_eq!(stored.referred_by, Some(parent.id));
        assert_eq!(parent.referred_by, None);
    }

    #[tokio::test]
    async fn test_register_fills_gaps_left_by_other_names() {
        let svc = service().await;
        seed_identity(&svc.pool, "Johnny", "JOHN000", None, Utc::now()).await;
        seed_identity(&svc.pool, "Johan", "JOHN002", None, Utc::now()).await;

        let created = svc
            .register(request("john", "Doe", "jd@example.com"))
            .await
            .unwrap();
        assert_eq!(created.referral_code, "JOHN001");

        let jo = svc.register(request("Jo", "Ng", "jo@example.com")).await.unwrap();
        assert_eq!(jo.referral_code, "JOXX000");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_contact() {
        let svc = service().await;
        let mut first = request("Anna", "Lee", "anna@example.com");
        first.phone = Some("+1 234 567 8901".to_string());
        let first = svc.register(first).await.unwrap();
        assert_eq!(first.phone.as_deref(), Some("+12345678901"));

        let err = svc
            .register(request("Anna", "Other", "anna@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateContact(_)));

        let mut same_phone = request("Anna", "Third", "anna3@example.com");
        same_phone.phone = Some("+12345678901".to_string());
        let err = svc.register(same_phone).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateContact(_)));

        let total = identities::Entity::find().count(&svc.pool).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_register_unknown_referral_code_persists_nothing() {
        let svc = service().await;
        let mut req = request("Mia", "Wong", "mia@example.com");
        req.referred_by_code = Some("NOPE000".to_string());

        let err = svc.register(req).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownReferralCode(_)));
        assert_eq!(identities::Entity::find().count(&svc.pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_blank_referral_code_is_ignored() {
        let svc = service().await;
        let mut req = request("Mia", "Wong", "mia@example.com");
        req.referred_by_code = Some("   ".to_string());

        let created = svc.register(req).await.unwrap();
        let stored = svc.graph.find_by_uuid(created.uuid).await.unwrap();
        assert_eq!(stored.referred_by, None);
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let svc = service().await;
        let mut req = request("Mia", "Wong", "mia@example.com");
        req.reenter_password = "Password124".to_string();

        let err = svc.register(req).await.unwrap_err();
        assert!(matches!(err, AppError::PasswordMismatch));
        assert_eq!(identities::Entity::find().count(&svc.pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let svc = service().await;
        let cases = [
            request("", "Doe", "a@example.com"),
            request("John", " ", "a@example.com"),
            request("John", "Doe", "not-an-email"),
        ];
        for req in cases {
            let err = svc.register(req).await.unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }
    }

    #[tokio::test]
    async fn test_artifact_failure_does_not_fail_registration() {
        let svc = service_with_store(Arc::new(BrokenArtifactStore)).await;

        let created = svc
            .register(request("John", "Doe", "john@example.com"))
            .await
            .unwrap();
        assert_eq!(created.referral_code, "JOHN000");
        assert_eq!(created.qr_code_url, None);

        let stored = svc.graph.find_by_uuid(created.uuid).await.unwrap();
        assert_eq!(stored.artifact_ref, None);
        assert!(matches!(
            svc.qr_code(created.uuid).await,
            Err(AppError::ArtifactNotFound)
        ));
    }

    #[tokio::test]
    async fn test_qr_code_and_lookups() {
        let svc = service().await;
        let created = svc
            .register(request("John", "Doe", "john@example.com"))
            .await
            .unwrap();

        let png = svc.qr_code(created.uuid).await.unwrap();
        assert_eq!(png, render_qr_png(&created.referral_link).unwrap());

        let referrer = svc.resolve_referral_code("JOHN000").await.unwrap();
        assert_eq!(referrer.display_name, "John");
        assert!(matches!(
            svc.resolve_referral_code("JANE000").await,
            Err(AppError::ReferralCodeNotFound(_))
        ));
        assert!(matches!(
            svc.get_identity(Uuid::new_v4()).await,
            Err(AppError::IdentityNotFound)
        ));
    }

    fn draft(display_name: &str, email: &str) -> identities::ActiveModel {
        identities::ActiveModel {
            display_name: Set(display_name.to_string()),
            last_name: Set("Doe".to_string()),
            email: Set(email.to_string()),
            phone: Set(None),
            gender: Set(None),
            password_hash: Set("not-a-real-hash".to_string()),
            referred_by: Set(None),
            link_expires_at: Set(None),
            link_click_count: Set(0),
            link_active: Set(true),
            artifact_ref: Set(None),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lost_code_race_retries_with_next_suffix() {
        let svc = service().await;
        let draft = draft("John", "john@example.com");
        let (svc_ref, draft_ref) = (&svc, &draft);

        // another registration commits JOHN000 between our scan and our insert
        let created = retry_on_collision(5, "identity registration", |attempt| async move {
            let model = svc_ref.prepare_identity("John", draft_ref).await?;
            if attempt == 1 {
                seed_identity(&svc_ref.pool, "Johnny", "JOHN000", None, Utc::now()).await;
            }
            svc_ref.commit_identity(model).await
        })
        .await
        .unwrap();
        assert_eq!(created.referral_code, "JOHN001");
        assert_eq!(created.email, "john@example.com");
        assert_eq!(identities::Entity::find().count(&svc.pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_commit_maps_duplicate_code_to_collision() {
        let svc = service().await;
        seed_identity(&svc.pool, "Johnny", "JOHN000", None, Utc::now()).await;

        let mut model = svc
            .prepare_identity("John", &draft("John", "john@example.com"))
            .await
            .unwrap();
        model.referral_code = Set("JOHN000".to_string());
        let err = svc.commit_identity(model).await.unwrap_err();
        assert!(matches!(err, AppError::AllocationCollision(column) if column == "referral_code"));

        let mut model = svc
            .prepare_identity("John", &draft("John", "john000@example.com"))
            .await
            .unwrap();
        model.referral_code = Set("JOHN009".to_string());
        let err = svc.commit_identity(model).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateContact(field) if field == "Email"));
    }

    #[tokio::test]
    async fn test_list_identities_newest_first() {
        let svc = service().await;
        let base = Utc::now() - chrono::Duration::days(3);
        for (i, code) in ["AAAA000", "BBBB000", "CCCC000"].iter().enumerate() {
            seed_identity(&svc.pool, code, code, None, base + chrono::Duration::days(i as i64)).await;
        }

        let query = IdentityListQuery {
            page: Some("1".to_string()),
            limit: Some("2".to_string()),
        };
        let page = svc.list_identities(&query).await.unwrap();
        let codes: Vec<&str> = page.items.iter().map(|i| i.referral_code.as_str()).collect();
        assert_eq!(codes, ["CCCC000", "BBBB000"]);
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.total_pages, 2);
        assert!(page.pagination.has_next);
    }
}
