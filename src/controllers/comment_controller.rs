// src/controllers/comment_controller.rs
use actix_web::{HttpResponse, delete, post, put, web};
use serde::Deserialize;

use super::{created, done};
use crate::data::SiteData;
use crate::error::AppError;
use crate::models::comment::NewComment;
use crate::session::SessionContext;

#[post("/api/comments")]
pub async fn post_comment(
    data: web::Data<SiteData>,
    payload: web::Json<NewComment>,
) -> Result<HttpResponse, AppError> {
    let id = data.add_comment(payload.into_inner()).await?;
    Ok(created("Komentar terkirim dan menunggu persetujuan", &id))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovePayload {
    pub approved: bool,
}

// Empty body means approve; anything else must be a valid payload.
fn parse_approval(body: &[u8]) -> Result<bool, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(true);
    }
    serde_json::from_slice::<ApprovePayload>(body)
        .map(|p| p.approved)
        .map_err(|e| AppError::BadRequest(format!("Payload tidak valid: {}", e)))
}

/// Body is optional; `{"approved": false}` withdraws an approval.
#[put("/api/adminpanel/comments/{id}/approve")]
pub async fn approve_comment(
    session: SessionContext,
    data: web::Data<SiteData>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    let approved = parse_approval(&body)?;
    data.update_comment(&path.into_inner(), approved).await?;
    Ok(done(if approved {
        "Komentar disetujui"
    } else {
        "Persetujuan komentar dibatalkan"
    }))
}

#[delete("/api/adminpanel/comments/{id}")]
pub async fn delete_comment(
    session: SessionContext,
    data: web::Data<SiteData>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;
    data.delete_comment(&path.into_inner()).await?;
    Ok(done("Komentar berhasil dihapus"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_body_is_optional_but_strict() {
        assert!(parse_approval(b"").unwrap());
        assert!(parse_approval(b" \n").unwrap());
        assert!(!parse_approval(br#"{"approved": false}"#).unwrap());
        assert!(matches!(
            parse_approval(br#"{"aproved": false}"#),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_approval(br#"{"approved": "false"}"#),
            Err(AppError::BadRequest(_))
        ));
    }
}
