//! Wiring of stores, identity provider and shared actix configuration.

use std::sync::Arc;

use actix_web::web::JsonConfig;

use crate::config::{AppConfig, StorageBackend};
use crate::data::SiteData;
use crate::db;
use crate::identity::{AuthError, IdentityProvider, MemoryIdentityProvider, SqlIdentityProvider};
use crate::store::local::LocalObjectStore;
use crate::store::memory::MemoryDocumentStore;
use crate::store::mysql::MySqlDocumentStore;
use crate::store::{DocumentStore, ObjectStore};

pub const JSON_LIMIT: usize = 50 * 1024 * 1024; // 50MB untuk JSON

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("admin provisioning: {0}")]
    Admin(#[from] AuthError),

    #[error("upload directory: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Backend {
    pub data: Arc<SiteData>,
    pub identity: Arc<dyn IdentityProvider>,
}

pub async fn build_backend(config: &AppConfig) -> Result<Backend, BootstrapError> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let objects: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(
        config.upload_dir.clone(),
        config.uploads_url(),
    ));

    let (documents, identity): (Arc<dyn DocumentStore>, Arc<dyn IdentityProvider>) =
        match config.storage {
            StorageBackend::MySql => {
                let pool = db::establish_connection(config).await?;
                db::run_migrations(&pool).await?;
                (
                    Arc::new(MySqlDocumentStore::new(pool.clone())),
                    Arc::new(SqlIdentityProvider::new(
                        pool,
                        config.jwt_secret.clone(),
                        chrono::Duration::days(config.session_ttl_days),
                    )),
                )
            }
            StorageBackend::Memory => {
                log::warn!("STORAGE_BACKEND=memory: content and accounts are lost on restart");
                (
                    Arc::new(MemoryDocumentStore::new()),
                    Arc::new(
                        MemoryIdentityProvider::new()
                            .with_session_ttl(chrono::Duration::days(config.session_ttl_days)),
                    ),
                )
            }
        };

    match config.admin_password.as_deref() {
        Some(password) => {
            identity.provision_admin(&config.admin_email, password).await?;
            log::info!("admin account is {}", config.admin_email);
        }
        None => log::warn!("ADMIN_PASSWORD not set, admin account not provisioned"),
    }

    Ok(Backend {
        data: Arc::new(SiteData::new(documents, objects)),
        identity,
    })
}

/// JSON extractor settings shared by the server and the HTTP tests.
pub fn json_config() -> JsonConfig {
    JsonConfig::default()
        .limit(JSON_LIMIT)
        .content_type_required(false)
        .error_handler(|err, _req| {
            log::warn!("JSON payload error: {}", err);
            let message = format!("Payload tidak valid: {}", err);
            actix_web::error::InternalError::from_response(
                err,
                actix_web::HttpResponse::BadRequest().json(serde_json::json!({
                    "success": false,
                    "message": message,
                })),
            )
            .into()
        })
}
