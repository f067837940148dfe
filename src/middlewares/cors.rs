use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        // dashboards and the registration page are served from other origins
        .allowed_origin_fn(|_, _req_head| true)
        .allowed_methods(vec!["GET", "POST", "PATCH", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
