use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::handlers::parse_identity_id;
use crate::models::*;
use crate::services::{IdentityService, ReferralService};

#[utoipa::path(
    get,
    path = "/identities/{identity_id}/referrals",
    tag = "referral",
    params(
        ("identity_id" = String, Path, description = "Identity UUID"),
        ReferralListQuery
    ),
    responses(
        (status = 200, description = "Direct referrals of the identity", body = ReferralListResponse),
        (status = 400, description = "Invalid page or limit"),
        (status = 404, description = "Identity not found")
    )
)]
pub async fn list_referrals(
    referral_service: web::Data<ReferralService>,
    path: web::Path<String>,
    query: web::Query<ReferralListQuery>,
) -> Result<HttpResponse> {
    let result = match parse_identity_id(&path) {
        Ok(uuid) => referral_service.list_referrals(uuid, &query).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::paginated(
            "Data fetched successfully",
            page,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/identities/{identity_id}/analytics",
    tag = "referral",
    params(
        ("identity_id" = String, Path, description = "Identity UUID")
    ),
    responses(
        (status = 200, description = "Referral counts, monthly breakdown and recent referrals", body = ReferralAnalytics),
        (status = 404, description = "Identity not found")
    )
)]
pub async fn get_analytics(
    referral_service: web::Data<ReferralService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let result = match parse_identity_id(&path) {
        Ok(uuid) => referral_service.analytics(uuid).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(analytics) => Ok(HttpResponse::Ok().json(ApiResponse::ok(
            "Data fetched successfully",
            analytics,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/refer/{referral_code}",
    tag = "referral",
    params(
        ("referral_code" = String, Path, description = "Referral code, e.g. JOHN000")
    ),
    responses(
        (status = 200, description = "Owner of the referral code", body = ReferrerResponse),
        (status = 404, description = "Referral code not found")
    )
)]
pub async fn resolve_referral_code(
    identity_service: web::Data<IdentityService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match identity_service.resolve_referral_code(&path).await {
        Ok(referrer) => Ok(HttpResponse::Ok().json(ApiResponse::ok(
            "Data fetched successfully",
            referrer,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn referral_config(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/identities/{identity_id}/referrals",
        web::get().to(list_referrals),
    )
    .route(
        "/identities/{identity_id}/analytics",
        web::get().to(get_analytics),
    )
    .route("/refer/{referral_code}", web::get().to(resolve_referral_code))
    .route("/refer/{referral_code}/", web::get().to(resolve_referral_code));
}
