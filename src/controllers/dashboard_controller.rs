// src/controllers/dashboard_controller.rs
use actix_web::{HttpResponse, get, web};

use crate::data::SiteData;
use crate::error::AppError;
use crate::session::{SessionContext, SessionObserver};
use crate::utils;

#[get("/api/adminpanel/dashboard")]
pub async fn get_dashboard(
    session: SessionContext,
    data: web::Data<SiteData>,
    observer: web::Data<SessionObserver>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    let summary = data
        .summary(observer.active_sessions(), &utils::current_year())
        .await;
    Ok(HttpResponse::Ok().json(summary))
}
