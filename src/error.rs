use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use validator::ValidationErrors;

use crate::identity::AuthError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Silakan login terlebih dahulu")]
    Unauthorized,

    #[error("Akses ditolak")]
    Forbidden,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                AppError::NotFound(format!("Data {} dengan id {} tidak ditemukan", collection, id))
            }
            StoreError::ObjectNotFound(locator) => {
                AppError::NotFound(format!("File {} tidak ditemukan", locator))
            }
            StoreError::InvalidLocator(locator) => {
                AppError::BadRequest(format!("Lokasi file tidak valid: {}", locator))
            }
            other => AppError::Store(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} tidak valid", field))
                })
            })
            .collect();
        messages.sort();
        messages.dedup();
        AppError::Validation(messages.join(", "))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Auth(e) if e.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("{}", self);
            "Terjadi kesalahan pada server".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(json!({
            "success": false,
            "message": message,
        }))
    }
}
