use actix_web::{HttpResponse, web};
use serde_json::json;

pub mod auth_controller;
pub mod comment_controller;
pub mod dashboard_controller;
pub mod gallery_controller;
pub mod home_controller;
pub mod news_controller;
pub mod program_controller;
pub mod upload_controller;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        //home_controller
        .service(home_controller::get_site)
        .service(home_controller::get_news)
        .service(home_controller::get_programs)
        .service(home_controller::get_gallery)
        .service(home_controller::get_comments)
        .service(home_controller::get_members)
        //auth_controller
        .service(auth_controller::login)
        .service(auth_controller::logout)
        .service(auth_controller::get_session)
        //comment_controller
        .service(comment_controller::post_comment)
        .service(comment_controller::approve_comment)
        .service(comment_controller::delete_comment)
        //news_controller
        .service(news_controller::create_news)
        .service(news_controller::update_news)
        .service(news_controller::delete_news)
        //program_controller
        .service(program_controller::create_program)
        .service(program_controller::update_program)
        .service(program_controller::delete_program)
        //gallery_controller
        .service(gallery_controller::create_gallery_item)
        .service(gallery_controller::update_gallery_item)
        .service(gallery_controller::delete_gallery_item)
        //upload_controller
        .service(upload_controller::upload_image)
        //dashboard_controller
        .service(dashboard_controller::get_dashboard);
}

pub(crate) fn created(message: &str, id: &str) -> HttpResponse {
    HttpResponse::Created().json(json!({
        "success": true,
        "message": message,
        "id": id,
    }))
}

pub(crate) fn done(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": message,
    }))
}
