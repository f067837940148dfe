use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::Gender;
use crate::handlers;
use crate::models::*;
use crate::utils::{LinkState, MonthlyCount, PaginationInfo};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::identity::register,
        handlers::identity::list_identities,
        handlers::identity::get_identity,
        handlers::identity::get_qr_code,
        handlers::link::access_link,
        handlers::link::regenerate_link,
        handlers::link::update_link,
        handlers::referral::list_referrals,
        handlers::referral::get_analytics,
        handlers::referral::resolve_referral_code,
    ),
    components(
        schemas(
            Gender,
            RegisterRequest,
            IdentityResponse,
            ReferrerResponse,
            RegenerateLinkResponse,
            UpdateLinkRequest,
            LinkStatusResponse,
            LinkState,
            ReferralItem,
            ReferralStats,
            ReferralAnalytics,
            ReferralListResponse,
            MonthlyCount,
            PaginationInfo,
        )
    ),
    tags(
        (name = "identity", description = "Registration and identity lookup API"),
        (name = "link", description = "Unique link API"),
        (name = "referral", description = "Referral listing and analytics API"),
    ),
    info(
        title = "Referral Backend API",
        version = "1.0.0",
        description = "Referral Backend REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
