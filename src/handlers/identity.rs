use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::handlers::parse_identity_id;
use crate::models::*;
use crate::services::IdentityService;

#[utoipa::path(
    post,
    path = "/identities/register",
    tag = "identity",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = IdentityResponse),
        (status = 400, description = "Validation failed, unknown referral code or password mismatch"),
        (status = 409, description = "Email or phone number already registered")
    )
)]
pub async fn register(
    identity_service: web::Data<IdentityService>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    match identity_service.register(request.into_inner()).await {
        Ok(identity) => Ok(HttpResponse::Created().json(ApiResponse::success(
            StatusCode::CREATED,
            "User registered successfully",
            identity,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/identities",
    tag = "identity",
    params(IdentityListQuery),
    responses(
        (status = 200, description = "Paginated identities, newest first", body = [IdentityResponse]),
        (status = 400, description = "Invalid page or limit")
    )
)]
pub async fn list_identities(
    identity_service: web::Data<IdentityService>,
    query: web::Query<IdentityListQuery>,
) -> Result<HttpResponse> {
    match identity_service.list_identities(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::paginated(
            "Data fetched successfully",
            page,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/identities/{identity_id}",
    tag = "identity",
    params(
        ("identity_id" = String, Path, description = "Identity UUID")
    ),
    responses(
        (status = 200, description = "Identity details", body = IdentityResponse),
        (status = 404, description = "Identity not found")
    )
)]
pub async fn get_identity(
    identity_service: web::Data<IdentityService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let result = match parse_identity_id(&path) {
        Ok(uuid) => identity_service.get_identity(uuid).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(identity) => Ok(HttpResponse::Ok().json(ApiResponse::ok(
            "Data fetched successfully",
            identity,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/identities/{identity_id}/qr-code",
    tag = "identity",
    params(
        ("identity_id" = String, Path, description = "Identity UUID")
    ),
    responses(
        (status = 200, description = "QR code encoding the referral link", content_type = "image/png"),
        (status = 404, description = "Identity or QR code not found")
    )
)]
pub async fn get_qr_code(
    identity_service: web::Data<IdentityService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let result = match parse_identity_id(&path) {
        Ok(uuid) => identity_service.qr_code(uuid).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(png) => Ok(HttpResponse::Ok().content_type("image/png").body(png)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn identity_config(cfg: &mut web::ServiceConfig) {
    // register must precede the `{identity_id}` routes
    cfg.route("/identities/register", web::post().to(register))
        .route("/identities", web::get().to(list_identities))
        .route("/identities/{identity_id}", web::get().to(get_identity))
        .route("/identities/{identity_id}/qr-code", web::get().to(get_qr_code));
}
