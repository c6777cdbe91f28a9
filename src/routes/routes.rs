use actix_cors::Cors;
use actix_web::{http, middleware::Condition, web};

use crate::handlers::api_handlers::{get_bot_visits, get_visits, ip_stream, recent_ips};
use crate::handlers::consent_handlers::consent_visit;
use crate::handlers::health_handlers::health_check;
use crate::handlers::page_handlers::{
    bot_info, consent_page, dashboard, guide, history, index, main_script, random_links, reset,
    submit,
};
use crate::handlers::qr_handlers::bot_qr;

/// Cross-origin access to the API, only active when origins are configured
fn api_cors(allowed_origins: &[String]) -> Condition<Cors> {
    let cors = allowed_origins.iter().fold(
        Cors::default()
            .allowed_methods(vec!["GET"])
            .allowed_header(http::header::ACCEPT)
            .allowed_header(http::header::CONTENT_TYPE)
            .max_age(3600),
        |cors, origin| cors.allowed_origin(origin),
    );
    Condition::new(!allowed_origins.is_empty(), cors)
}

/// Configure the routes
pub fn init_routes(cfg: &mut web::ServiceConfig, cors_origins: &[String]) {
    // Pages
    cfg.route("/", web::get().to(index))
        .route("/submit", web::post().to(submit))
        .route("/bot/{token}", web::get().to(bot_info))
        .route("/bot/{token}/qr", web::get().to(bot_qr))
        .route("/consent/{token}", web::get().to(consent_page))
        .route("/consent/{token}/visit", web::post().to(consent_visit))
        .route("/dashboard", web::get().to(dashboard))
        .route("/guide", web::get().to(guide))
        .route("/history", web::get().to(history))
        .route("/reset", web::get().to(reset))
        .route("/data/rlinks.json", web::get().to(random_links))
        .route("/static/js/main.js", web::get().to(main_script));

    // JSON and event-stream API
    cfg.service(
        web::scope("/api")
            .wrap(api_cors(cors_origins))
            .route("/ip-stream", web::get().to(ip_stream))
            .route("/recent-ips", web::get().to(recent_ips))
            .route("/visits", web::get().to(get_visits))
            .route("/visits/{token}", web::get().to(get_bot_visits))
            .route("/health/check", web::get().to(health_check)),
    );
}
