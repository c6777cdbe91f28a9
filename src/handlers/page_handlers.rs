use actix_web::{HttpRequest, HttpResponse, Result, error, http, web};
use log::{error, info, warn};
use validator::Validate;

use crate::handlers::qr_handlers::consent_qr_svg;
use crate::models::bot::BotRegistration;
use crate::models::visits::{MAIN_BUCKET, total};
use crate::state::app_state::AppState;
use crate::structs::bot_request::SubmitBotRequest;
use crate::utils::flash::{Flash, clear_flash_cookie, read_flash, redirect_with_flash};
use crate::views::{
    BotInfoTemplate, BotSummary, ConsentTemplate, DashboardTemplate, GuideTemplate,
    HistoryTemplate, IndexTemplate, render,
};

const MAIN_SCRIPT: &str = include_str!("../../static/js/main.js");

/// Base for consent links: configured public URL, else the scheme and host of this request.
fn public_base(app_state: &AppState, req: &HttpRequest) -> String {
    match &app_state.config.public_url {
        Some(url) => url.clone(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    }
}

/// Landing page, counts every render against the "main" bucket
pub async fn index(app_state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let visits = app_state
        .visits
        .record_visit(None)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;
    let total_visits = visits.get(MAIN_BUCKET).map(total).unwrap_or(0);

    let bots = app_state
        .bots
        .all()
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;

    let flash = read_flash(&req, &app_state.config.session_secret);
    let template = IndexTemplate {
        total_visits,
        bots: bots
            .iter()
            .map(|(token, bot)| BotSummary::new(token, bot))
            .collect(),
        flash: flash.map(Flash::message),
    };

    let mut response = render(&template)?;
    if flash.is_some() {
        response
            .add_cookie(&clear_flash_cookie())
            .map_err(error::ErrorInternalServerError)?;
    }
    Ok(response)
}

/// Register a bot after checking its token against the Bot API
pub async fn submit(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    web::Form(form): web::Form<SubmitBotRequest>,
) -> Result<HttpResponse> {
    let secret = &app_state.config.session_secret;
    let form = form.trimmed();

    if form.has_missing_fields() {
        return Ok(redirect_with_flash("/", secret, Flash::AllFieldsRequired));
    }
    if let Err(errors) = form.validate() {
        warn!("Rejected registration: {}", errors);
        return Ok(redirect_with_flash("/", secret, Flash::InvalidUrl));
    }
    if !form.has_web_url() {
        warn!("Rejected registration: target URL is not http(s)");
        return Ok(redirect_with_flash("/", secret, Flash::InvalidUrl));
    }

    let info = match app_state.telegram.fetch_identity(&form.bot_token).await {
        Some(info) => info,
        None => return Ok(redirect_with_flash("/", secret, Flash::InvalidToken)),
    };

    let token = form.bot_token;
    let consent_url = format!("{}/consent/{}", public_base(&app_state, &req), token);
    let registration = BotRegistration::new(form.telegram_id, form.url, info, consent_url);
    let username = registration.username().to_string();

    if let Err(e) = app_state.bots.register(&token, registration).await {
        error!("Error processing bot info: {:#}", e);
        return Ok(redirect_with_flash("/", secret, Flash::ProcessingError));
    }
    info!("Registered bot @{}", username);

    Ok(HttpResponse::Found()
        .append_header((http::header::LOCATION, format!("/bot/{}", token)))
        .finish())
}

pub async fn bot_info(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let token = path.into_inner();
    let bot = app_state
        .bots
        .get(&token)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;

    let Some(bot) = bot else {
        return Ok(redirect_with_flash(
            "/",
            &app_state.config.session_secret,
            Flash::BotNotFound,
        ));
    };

    let total_visits = app_state
        .visits
        .total(&token)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;
    let qr_svg = consent_qr_svg(&bot.consent_url)
        .map_err(|e| error::ErrorInternalServerError(format!("{:#}", e)))?;

    render(&BotInfoTemplate {
        bot: BotSummary::new(&token, &bot),
        telegram_id: bot.telegram_id,
        total_visits,
        qr_svg,
    })
}

/// Visitor-facing page; its script reports the visit and forwards to the target URL
pub async fn consent_page(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let token = path.into_inner();
    let bot = app_state
        .bots
        .get(&token)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;

    match bot {
        Some(bot) => render(&ConsentTemplate {
            username: bot.username().to_string(),
            target_url: bot.url,
            bot_token: token,
        }),
        None => Ok(redirect_with_flash(
            "/",
            &app_state.config.session_secret,
            Flash::InvalidToken,
        )),
    }
}

pub async fn dashboard() -> Result<HttpResponse> {
    render(&DashboardTemplate)
}

pub async fn guide() -> Result<HttpResponse> {
    render(&GuideTemplate)
}

pub async fn history(app_state: web::Data<AppState>) -> Result<HttpResponse> {
    let bots = app_state
        .bots
        .all()
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;

    render(&HistoryTemplate {
        bots: bots
            .iter()
            .map(|(token, bot)| BotSummary::new(token, bot))
            .collect(),
    })
}

pub async fn reset() -> HttpResponse {
    HttpResponse::Found()
        .append_header((http::header::LOCATION, "/"))
        .finish()
}

/// Suggested target URLs for the "Random" button, read from `rlinks.json`
pub async fn random_links(app_state: web::Data<AppState>) -> Result<HttpResponse> {
    let links = app_state
        .store
        .load_optional::<serde_json::Value>("rlinks")
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Storage error: {}", e)))?;

    Ok(match links {
        Some(links) => HttpResponse::Ok().json(links),
        None => HttpResponse::NotFound().finish(),
    })
}

pub async fn main_script() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/javascript; charset=utf-8")
        .body(MAIN_SCRIPT)
}
