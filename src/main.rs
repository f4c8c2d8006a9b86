// main.rs
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;

use kader_budaya::app;
use kader_budaya::config::AppConfig;
use kader_budaya::controllers;
use kader_budaya::identity::IdentityProvider;
use kader_budaya::session::{SESSION_SWEEP_INTERVAL, SessionObserver};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("starting up...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Konfigurasi tidak valid: {}", e);
            std::process::exit(1);
        }
    };

    let backend = match app::build_backend(&config).await {
        Ok(backend) => backend,
        Err(e) => {
            log::error!("Gagal inisialisasi backend: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = backend.data.refresh_all().await {
        log::warn!("initial load failed, starting with empty content: {}", e);
    }

    let observer = web::Data::new(SessionObserver::start(
        Arc::clone(&backend.identity),
        SESSION_SWEEP_INTERVAL,
    ));
    let identity: web::Data<dyn IdentityProvider> = web::Data::from(Arc::clone(&backend.identity));
    let data = web::Data::from(Arc::clone(&backend.data));
    let bind = (config.bind_addr.clone(), config.port);
    let config = web::Data::new(config);

    log::info!("listening on {}:{}", bind.0, bind.1);
    let server_observer = observer.clone();
    let result = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config.cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(data.clone())
            .app_data(identity.clone())
            .app_data(server_observer.clone())
            .app_data(config.clone())
            .app_data(app::json_config())
            .wrap(cors)
            .wrap(Logger::default())
            .service(Files::new("/uploads", config.upload_dir.clone()))
            .configure(controllers::configure)
    })
    .bind(bind)?
    .run()
    .await;

    observer.stop();
    result
}
