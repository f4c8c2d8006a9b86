use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};

use crate::config::AppConfig;

pub async fn establish_connection(config: &AppConfig) -> Result<Pool<MySql>, sqlx::Error> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| sqlx::Error::Configuration("DATABASE_URL tidak ditemukan di .env".into()))?;

    let pool = MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(database_url)
        .await
        .map_err(|e| {
            log::error!("Gagal membuat pool database: {:?}", e);
            e
        })?;

    Ok(pool)
}

pub async fn run_migrations(pool: &Pool<MySql>) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("database migrations applied");
    Ok(())
}
