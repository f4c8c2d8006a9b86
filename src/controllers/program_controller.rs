// src/controllers/program_controller.rs
use actix_web::{HttpResponse, delete, post, put, web};

use super::{created, done};
use crate::data::SiteData;
use crate::error::AppError;
use crate::models::program::{NewProgramSie, ProgramPatch};
use crate::session::SessionContext;

#[post("/api/adminpanel/programs")]
pub async fn create_program(
    session: SessionContext,
    data: web::Data<SiteData>,
    payload: web::Json<NewProgramSie>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    let id = data.add_program_sie(payload.into_inner()).await?;
    Ok(created("Program kerja berhasil ditambahkan", &id))
}

#[put("/api/adminpanel/programs/{id}")]
pub async fn update_program(
    session: SessionContext,
    data: web::Data<SiteData>,
    path: web::Path<String>,
    payload: web::Json<ProgramPatch>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    data.update_program(&path.into_inner(), payload.into_inner()).await?;
    Ok(done("Program kerja berhasil diperbarui"))
}

#[delete("/api/adminpanel/programs/{id}")]
pub async fn delete_program(
    session: SessionContext,
    data: web::Data<SiteData>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    data.delete_program_sie(&path.into_inner()).await?;
    Ok(done("Program kerja berhasil dihapus"))
}
