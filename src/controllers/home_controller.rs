// src/controllers/home_controller.rs
use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;

use crate::data::SiteData;
use crate::models::gallery::GalleryItem;
use crate::utils;

#[get("/api/site")]
pub async fn get_site(data: web::Data<SiteData>) -> impl Responder {
    HttpResponse::Ok().json(data.snapshot().await)
}

#[get("/api/news")]
pub async fn get_news(data: web::Data<SiteData>) -> impl Responder {
    HttpResponse::Ok().json(data.news().await)
}

#[get("/api/programs")]
pub async fn get_programs(data: web::Data<SiteData>) -> impl Responder {
    HttpResponse::Ok().json(data.programs().await)
}

#[get("/api/gallery")]
pub async fn get_gallery(data: web::Data<SiteData>) -> impl Responder {
    HttpResponse::Ok().json(data.gallery().await)
}

#[get("/api/comments")]
pub async fn get_comments(data: web::Data<SiteData>) -> impl Responder {
    HttpResponse::Ok().json(data.comments().await)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberCard {
    #[serde(flatten)]
    item: GalleryItem,
    caption: String,
}

// struktur kepengurusan periode berjalan
#[get("/api/members")]
pub async fn get_members(data: web::Data<SiteData>) -> impl Responder {
    let members: Vec<MemberCard> = data
        .members(&utils::current_year())
        .await
        .into_iter()
        .map(|item| MemberCard {
            caption: item.caption(),
            item,
        })
        .collect();
    HttpResponse::Ok().json(members)
}
