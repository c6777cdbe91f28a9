use actix_web::{HttpResponse, web};

use crate::state::app_state::AppState;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    // Reading the bots document proves the data directory is usable
    match state.bots.all().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "subscribers": state.hub.subscriber_count()
        })),
        Err(_) => HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "error": "Data store unavailable" })),
    }
}
