use actix_web::{HttpResponse, Result, error, http, web};
use futures_util::stream;
use log::{debug, error, info};
use std::convert::Infallible;
use tokio::time::MissedTickBehavior;

use crate::models::ip_event::IpEvent;
use crate::models::visits::MAIN_BUCKET;
use crate::state::app_state::AppState;

const KEEP_ALIVE_FRAME: &str = ": keep-alive\n\n";

pub fn format_sse(data: &str) -> String {
    format!("data: {}\n\n", data)
}

/// Server-sent events, one frame per accepted consent visit.
///
/// Waits on either the next event or the keep-alive tick. A keep-alive write
/// to a gone client fails, actix drops the stream, and dropping the
/// subscription removes its queue from the hub.
pub async fn ip_stream(app_state: web::Data<AppState>) -> HttpResponse {
    let subscription = app_state.hub.subscribe();
    let mut ticker = tokio::time::interval(app_state.config.stream_keep_alive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let frames = stream::unfold(
        (subscription, ticker),
        |(mut subscription, mut ticker)| async move {
            let frame = tokio::select! {
                event = subscription.recv() => {
                    let event = event?;
                    match serde_json::to_string(&event) {
                        Ok(json) => {
                            debug!("Sending data to client (ID: {}): {}", subscription.id(), json);
                            format_sse(&json)
                        }
                        Err(e) => {
                            error!(
                                "Error sending data to client (ID: {}): {}",
                                subscription.id(),
                                e
                            );
                            return None;
                        }
                    }
                }
                _ = ticker.tick() => KEEP_ALIVE_FRAME.to_string(),
            };
            Some((
                Ok::<_, Infallible>(web::Bytes::from(frame)),
                (subscription, ticker),
            ))
        },
    );

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((http::header::CACHE_CONTROL, "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(frames)
}

/// Every approved IP across all bots, rebuilt from the registrations
pub async fn recent_ips(app_state: web::Data<AppState>) -> HttpResponse {
    match app_state.bots.all().await {
        Ok(bots) => {
            let events: Vec<IpEvent> = bots.values().flat_map(IpEvent::history_for).collect();
            info!("Returning {} recent IPs", events.len());
            HttpResponse::Ok().json(events)
        }
        Err(e) => {
            error!("Error getting recent IPs: {:#}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.to_string()
            }))
        }
    }
}

pub async fn get_visits(app_state: web::Data<AppState>) -> Result<HttpResponse> {
    let daily = app_state
        .visits
        .daily(MAIN_BUCKET)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;
    Ok(HttpResponse::Ok().json(daily))
}

pub async fn get_bot_visits(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let token = path.into_inner();
    let daily = app_state
        .visits
        .daily(&token)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;
    Ok(HttpResponse::Ok().json(daily))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_frames_are_terminated_by_a_blank_line() {
        assert_eq!(format_sse("{\"a\":1}"), "data: {\"a\":1}\n\n");
    }
}
