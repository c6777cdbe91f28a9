use actix_web::{HttpResponse, Result, error};
use askama::Template;

use crate::models::bot::BotRegistration;

/// Render an askama page into a `200 text/html` response.
pub fn render<T: Template>(template: &T) -> Result<HttpResponse> {
    let body = template
        .render()
        .map_err(|e| error::ErrorInternalServerError(format!("Template error: {}", e)))?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

pub struct BotSummary {
    pub token: String,
    pub username: String,
    pub first_name: String,
    pub url: String,
    pub consent_url: String,
    pub created_at: String,
    pub approved_ips: Vec<String>,
}

impl BotSummary {
    pub fn new(token: &str, bot: &BotRegistration) -> Self {
        Self {
            token: token.to_string(),
            username: bot.username().to_string(),
            first_name: bot.first_name().to_string(),
            url: bot.url.clone(),
            consent_url: bot.consent_url.clone(),
            created_at: bot.created_at.clone(),
            approved_ips: bot.approved_ips.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub total_visits: u64,
    pub bots: Vec<BotSummary>,
    pub flash: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "bot_info.html")]
pub struct BotInfoTemplate {
    pub bot: BotSummary,
    pub telegram_id: String,
    pub total_visits: u64,
    pub qr_svg: String,
}

#[derive(Template)]
#[template(path = "consent.html")]
pub struct ConsentTemplate {
    pub bot_token: String,
    pub username: String,
    pub target_url: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate;

#[derive(Template)]
#[template(path = "guide.html")]
pub struct GuideTemplate;

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate {
    pub bots: Vec<BotSummary>,
}
