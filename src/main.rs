use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use referral_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::LocalArtifactStore,
    handlers,
    middlewares::create_cors,
    services::*,
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration file");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let store = Arc::new(LocalArtifactStore::from_config(&config.artifacts));
    let artifact_service = ArtifactService::new(pool.clone(), store, config.links.clone());
    let identity_service = IdentityService::new(pool.clone(), artifact_service, &config);
    let link_service = LinkService::new(pool.clone(), &config);
    let referral_service = ReferralService::new(pool.clone(), &config);

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(handlers::json_config())
            .app_data(web::Data::new(identity_service.clone()))
            .app_data(web::Data::new(link_service.clone()))
            .app_data(web::Data::new(referral_service.clone()))
            .configure(swagger_config)
            .service(web::scope("/api/v1").configure(handlers::api_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
