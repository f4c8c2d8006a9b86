use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@kaderbudaya.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    MySql,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(StorageBackend::MySql),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid {
                key: "STORAGE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} tidak ditemukan di .env")]
    Missing(&'static str),

    #[error("nilai {key} tidak valid: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub admin_email: String,
    pub admin_password: Option<String>,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub cors_origin: String,
    pub session_ttl_days: i64,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `DATABASE_URL` and `JWT_SECRET` are only
    /// required for the MySQL backend.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let storage = match get("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::MySql,
        };

        let database_url = get("DATABASE_URL");
        let jwt_secret = get("JWT_SECRET");
        if storage == StorageBackend::MySql {
            if database_url.is_none() {
                return Err(ConfigError::Missing("DATABASE_URL"));
            }
            if jwt_secret.is_none() {
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
        }

        let port = parse_or(get("PORT"), "PORT", 8000u16)?;
        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let public_base_url = get("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let session_ttl_days = parse_or(get("SESSION_TTL_DAYS"), "SESSION_TTL_DAYS", 7i64)?;
        if session_ttl_days <= 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_DAYS",
                value: session_ttl_days.to_string(),
            });
        }

        Ok(AppConfig {
            storage,
            database_url,
            jwt_secret: jwt_secret.unwrap_or_default(),
            admin_email: get("ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
            admin_password: get("ADMIN_PASSWORD"),
            upload_dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string())),
            public_base_url,
            bind_addr,
            port,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string()),
            session_ttl_days,
            db_max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 5u32)?,
        })
    }

    /// URL prefix under which uploaded images are served.
    pub fn uploads_url(&self) -> String {
        format!("{}/uploads", self.public_base_url)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn mysql_backend_requires_database_and_secret() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing("DATABASE_URL"))));
        assert!(matches!(
            config(&[("DATABASE_URL", "mysql://root@localhost/kader")]),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    fn memory_backend_uses_defaults() {
        let cfg = config(&[("STORAGE_BACKEND", "Memory")]).unwrap();
        assert_eq!(cfg.storage, StorageBackend::Memory);
        assert_eq!(cfg.admin_email, DEFAULT_ADMIN_EMAIL);
        assert_eq!(cfg.admin_password, None);
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.uploads_url(), "http://localhost:8000/uploads");
        assert_eq!(cfg.session_ttl_days, 7);
        assert_eq!(cfg.db_max_connections, 5);
    }

    #[test]
    fn explicit_values_win() {
        let cfg = config(&[
            ("DATABASE_URL", "mysql://root@localhost/kader"),
            ("JWT_SECRET", "rahasia"),
            ("ADMIN_EMAIL", "ketua@kaderbudaya.com"),
            ("ADMIN_PASSWORD", "  "),
            ("PUBLIC_BASE_URL", "https://kaderbudaya.com/"),
            ("PORT", "9090"),
        ])
        .unwrap();
        assert_eq!(cfg.storage, StorageBackend::MySql);
        assert_eq!(cfg.admin_email, "ketua@kaderbudaya.com");
        assert_eq!(cfg.admin_password, None);
        assert_eq!(cfg.uploads_url(), "https://kaderbudaya.com/uploads");
        assert_eq!(cfg.port, 9090);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("STORAGE_BACKEND", "firebase")]),
            Err(ConfigError::Invalid { key: "STORAGE_BACKEND", .. })
        ));
        assert!(matches!(
            config(&[("STORAGE_BACKEND", "memory"), ("PORT", "http")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("STORAGE_BACKEND", "memory"), ("SESSION_TTL_DAYS", "0")]),
            Err(ConfigError::Invalid { key: "SESSION_TTL_DAYS", .. })
        ));
    }
}
