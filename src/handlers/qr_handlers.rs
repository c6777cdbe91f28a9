use actix_web::{HttpResponse, Responder, Result, error, web};
use anyhow::Context;
use qrcode::QrCode;
use qrcode::render::svg;

use crate::state::app_state::AppState;

/// Render the consent link as an SVG QR code.
pub fn consent_qr_svg(consent_url: &str) -> anyhow::Result<String> {
    let qr_code = QrCode::new(consent_url.as_bytes()).context("QR code generation error")?;

    Ok(qr_code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .quiet_zone(true)
        .build())
}

/// QR code of a bot's consent page
pub async fn bot_qr(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<impl Responder> {
    let token = path.into_inner();
    let bot = app_state
        .bots
        .get(&token)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;

    match bot {
        Some(bot) => {
            let svg = consent_qr_svg(&bot.consent_url)
                .map_err(|e| error::ErrorInternalServerError(format!("{:#}", e)))?;
            Ok(HttpResponse::Ok().content_type("image/svg+xml").body(svg))
        }
        None => Ok(HttpResponse::NotFound().body("Bot not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consent_qr_is_svg() {
        let svg = consent_qr_svg("http://localhost:5000/consent/T1").unwrap();
        assert!(svg.contains("<svg"));
    }
}
