// src/controllers/news_controller.rs
use actix_web::{HttpResponse, delete, post, put, web};
use serde::Deserialize;

use super::{created, done};
use crate::data::SiteData;
use crate::error::AppError;
use crate::models::news::{NewNews, NewsPatch};
use crate::session::SessionContext;

#[derive(Deserialize, Default)]
pub struct ImageQuery {
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

#[post("/api/adminpanel/news")]
pub async fn create_news(
    session: SessionContext,
    data: web::Data<SiteData>,
    payload: web::Json<NewNews>,
) -> Result<HttpResponse, AppError> {
    let admin = session.require_admin()?;
    let id = data.add_news(payload.into_inner()).await?;
    log::info!("{} published news {}", admin.email, id);
    Ok(created("Berita berhasil ditambahkan", &id))
}

#[put("/api/adminpanel/news/{id}")]
pub async fn update_news(
    session: SessionContext,
    data: web::Data<SiteData>,
    path: web::Path<String>,
    payload: web::Json<NewsPatch>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    data.update_news(&path.into_inner(), payload.into_inner()).await?;
    Ok(done("Berita berhasil diperbarui"))
}

#[delete("/api/adminpanel/news/{id}")]
pub async fn delete_news(
    session: SessionContext,
    data: web::Data<SiteData>,
    path: web::Path<String>,
    query: web::Query<ImageQuery>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    let id = path.into_inner();

    // tanpa imageUrl di query, pakai gambar yang tercatat
    let image_url = match query.into_inner().image_url {
        Some(url) => Some(url),
        None => data.find_news(&id).await.and_then(|n| n.image_url),
    };

    data.delete_news(&id, image_url.as_deref()).await?;
    Ok(done("Berita berhasil dihapus"))
}
