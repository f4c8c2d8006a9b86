// src/controllers/gallery_controller.rs
use actix_web::{HttpResponse, delete, post, put, web};

use super::news_controller::ImageQuery;
use super::{created, done};
use crate::data::SiteData;
use crate::error::AppError;
use crate::models::gallery::{GalleryPatch, NewGalleryItem};
use crate::session::SessionContext;

#[post("/api/adminpanel/gallery")]
pub async fn create_gallery_item(
    session: SessionContext,
    data: web::Data<SiteData>,
    payload: web::Json<NewGalleryItem>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    let id = data.add_gallery_item(payload.into_inner()).await?;
    Ok(created("Anggota berhasil ditambahkan", &id))
}

#[put("/api/adminpanel/gallery/{id}")]
pub async fn update_gallery_item(
    session: SessionContext,
    data: web::Data<SiteData>,
    path: web::Path<String>,
    payload: web::Json<GalleryPatch>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    data.update_gallery_item(&path.into_inner(), payload.into_inner())
        .await?;
    Ok(done("Data anggota berhasil diperbarui"))
}

#[delete("/api/adminpanel/gallery/{id}")]
pub async fn delete_gallery_item(
    session: SessionContext,
    data: web::Data<SiteData>,
    path: web::Path<String>,
    query: web::Query<ImageQuery>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    let id = path.into_inner();

    let image_url = match query.into_inner().image_url {
        Some(url) => url,
        None => data
            .find_gallery_item(&id)
            .await
            .map(|g| g.image_url)
            .unwrap_or_default(),
    };

    data.delete_gallery_item(&id, &image_url).await?;
    Ok(done("Anggota berhasil dihapus"))
}
