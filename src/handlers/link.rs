use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::handlers::parse_identity_id;
use crate::models::*;
use crate::services::LinkService;

#[utoipa::path(
    get,
    path = "/links/{token}",
    tag = "link",
    params(
        ("token" = String, Path, description = "Unique link token")
    ),
    responses(
        (status = 200, description = "Link opened, click counted", body = IdentityResponse),
        (status = 403, description = "Link is inactive"),
        (status = 404, description = "Link not found"),
        (status = 410, description = "Link has expired")
    )
)]
pub async fn access_link(
    link_service: web::Data<LinkService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match link_service.access_by_token(&path).await {
        Ok(identity) => Ok(HttpResponse::Ok().json(ApiResponse::ok(
            "Link accessed successfully",
            identity,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/identities/{identity_id}/link/regenerate",
    tag = "link",
    params(
        ("identity_id" = String, Path, description = "Identity UUID")
    ),
    responses(
        (status = 200, description = "New token issued, clicks reset", body = RegenerateLinkResponse),
        (status = 404, description = "Identity not found"),
        (status = 409, description = "No unique token could be allocated")
    )
)]
pub async fn regenerate_link(
    link_service: web::Data<LinkService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let result = match parse_identity_id(&path) {
        Ok(uuid) => link_service.regenerate_link(uuid).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(link) => Ok(HttpResponse::Ok().json(ApiResponse::ok(
            "Link regenerated successfully",
            link,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/identities/{identity_id}/link",
    tag = "link",
    request_body = UpdateLinkRequest,
    params(
        ("identity_id" = String, Path, description = "Identity UUID")
    ),
    responses(
        (status = 200, description = "Link settings updated", body = LinkStatusResponse),
        (status = 400, description = "Nothing to update"),
        (status = 404, description = "Identity not found")
    )
)]
pub async fn update_link(
    link_service: web::Data<LinkService>,
    path: web::Path<String>,
    request: web::Json<UpdateLinkRequest>,
) -> Result<HttpResponse> {
    let result = match parse_identity_id(&path) {
        Ok(uuid) => link_service.update_link(uuid, request.into_inner()).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(status) => Ok(HttpResponse::Ok().json(ApiResponse::ok(
            "Link updated successfully",
            status,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn link_config(cfg: &mut web::ServiceConfig) {
    // handed-out unique links end with a slash
    cfg.route("/links/{token}", web::get().to(access_link))
        .route("/links/{token}/", web::get().to(access_link))
        .route(
            "/identities/{identity_id}/link/regenerate",
            web::post().to(regenerate_link),
        )
        .route("/identities/{identity_id}/link", web::patch().to(update_link));
}
