use actix_web::{HttpRequest, HttpResponse, Result, error, web};
use log::info;

use crate::models::ip_event::IpEvent;
use crate::services::telegram::notify_owner;
use crate::state::app_state::AppState;
use crate::utils::client_ip::client_ip;

/// Record a consent visit.
///
/// The IP is stored once per bot, but the owner notification, the dashboard
/// event and the visit counter fire on every call, repeat visitors included.
pub async fn consent_visit(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let token = path.into_inner();
    let visitor_ip = client_ip(&req);

    let visit = app_state
        .bots
        .approve_ip(&token, &visitor_ip)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;

    let Some(visit) = visit else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Invalid token"
        })));
    };
    let bot = visit.bot;

    info!("New visit from IP: {} for bot: @{}", visitor_ip, bot.username());
    if visit.newly_approved {
        info!("Approved new IP {} for @{}", visitor_ip, bot.username());
    }

    notify_owner(
        app_state.telegram.as_ref(),
        &token,
        &bot.telegram_id,
        &visitor_ip,
        &bot.url,
    )
    .await;

    let event = IpEvent::new(&visitor_ip, &bot);
    let reached = app_state.hub.publish(&event);
    info!("Broadcast IP update to {} clients", reached);

    app_state
        .visits
        .record_visit(Some(&token))
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
