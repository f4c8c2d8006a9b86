// src/controllers/auth_controller.rs
use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Deserialize;
use serde_json::json;

use crate::auth;
use crate::config::AppConfig;
use crate::session::SessionContext;

#[derive(Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[post("/api/login")]
pub async fn login(
    mut session: SessionContext,
    config: web::Data<AppConfig>,
    payload: web::Json<LoginPayload>,
) -> impl Responder {
    let outcome = session.login(&payload.email, &payload.password).await;
    if !outcome.success {
        return HttpResponse::Unauthorized().json(outcome);
    }

    match session.token() {
        Some(token) => HttpResponse::Ok()
            .cookie(auth::session_cookie(token, config.session_ttl_days))
            .json(outcome),
        None => HttpResponse::Ok().json(outcome),
    }
}

#[post("/api/logout")]
pub async fn logout(mut session: SessionContext) -> impl Responder {
    let outcome = session.logout().await;
    // cookie selalu dihapus, walaupun sesi di server sudah tidak ada
    HttpResponse::Ok()
        .cookie(auth::expired_cookie())
        .json(outcome)
}

#[get("/api/session")]
pub async fn get_session(session: SessionContext) -> impl Responder {
    match session.current() {
        Some(identity) => HttpResponse::Ok().json(json!({
            "authenticated": true,
            "email": identity.email,
            "role": identity.role,
            "isAdmin": identity.is_admin(),
        })),
        None => HttpResponse::Ok().json(json!({
            "authenticated": false,
            "isAdmin": false,
        })),
    }
}
