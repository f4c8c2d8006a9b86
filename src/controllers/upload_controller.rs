// src/controllers/upload_controller.rs
use actix_multipart::Multipart;
use actix_web::{HttpResponse, post, web};
use bytes::BytesMut;
use futures_util::TryStreamExt as _;
use serde_json::json;

use crate::data::SiteData;
use crate::error::AppError;
use crate::session::SessionContext;
use crate::utils::DEFAULT_UPLOAD_FOLDER;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

struct ImageUpload {
    bytes: BytesMut,
    filename: String,
    folder: String,
}

// parse multipart → file `image` + optional text field `folder`
async fn parse_upload_multipart(mut payload: Multipart) -> Result<ImageUpload, AppError> {
    let mut upload = ImageUpload {
        bytes: BytesMut::new(),
        filename: String::new(),
        folder: DEFAULT_UPLOAD_FOLDER.to_string(),
    };
    let mut has_image = false;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(format!("Form upload tidak valid: {}", e)))?
    {
        let cd = field.content_disposition().cloned();
        let name = cd.as_ref().and_then(|c| c.get_name()).unwrap_or("");

        match name {
            "image" => {
                if let Some(mime) = field.content_type() {
                    if mime.type_().as_str() != "image" {
                        return Err(AppError::Validation("File harus berupa gambar".into()));
                    }
                }
                upload.filename = cd
                    .as_ref()
                    .and_then(|c| c.get_filename())
                    .unwrap_or("")
                    .to_string();
                while let Some(chunk) = field
                    .try_next()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Upload terputus: {}", e)))?
                {
                    if upload.bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
                        return Err(AppError::Validation(
                            "Ukuran gambar maksimal 10MB".into(),
                        ));
                    }
                    upload.bytes.extend_from_slice(&chunk);
                }
                has_image = true;
            }
            "folder" => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .try_next()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Upload terputus: {}", e)))?
                {
                    bytes.extend_from_slice(&chunk);
                }
                let folder = String::from_utf8(bytes).unwrap_or_default();
                if !folder.trim().is_empty() {
                    upload.folder = folder.trim().to_string();
                }
            }
            _ => {
                // abaikan field lain
                while field
                    .try_next()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Upload terputus: {}", e)))?
                    .is_some()
                {}
            }
        }
    }

    if !has_image {
        return Err(AppError::Validation("Field image wajib diisi".into()));
    }
    Ok(upload)
}

#[post("/api/adminpanel/upload")]
pub async fn upload_image(
    session: SessionContext,
    data: web::Data<SiteData>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    let upload = parse_upload_multipart(payload).await?;
    let url = data
        .upload_image(&upload.bytes, &upload.filename, &upload.folder)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Gambar berhasil diunggah",
        "url": url,
    })))
}
