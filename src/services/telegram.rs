//! Telegram Bot API client.
//!
//! Only two calls are used: `getMe` to validate a token at registration time
//! and `sendMessage` to tell the owner about a consent visit. Both are
//! best-effort; failures are logged and reported as `None` / `false`.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait BotApi: Send + Sync {
    /// Identity payload of the bot behind `token`, `None` if the token is not usable.
    async fn fetch_identity(&self, token: &str) -> Option<Value>;

    /// Send `text` to `chat_id` through the bot. Returns whether the API accepted it.
    async fn send_message(&self, token: &str, chat_id: &str, text: &str) -> bool;
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, token, method)
    }

    async fn get_me(&self, token: &str) -> Result<Option<Value>> {
        let response = self
            .client
            .get(self.method_url(token, "getMe"))
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("getMe request failed")?;

        if response.status() != reqwest::StatusCode::OK {
            warn!("getMe rejected with status {}", response.status());
            return Ok(None);
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("getMe returned an unreadable body")?;
        if !body.ok {
            warn!(
                "getMe returned ok=false: {}",
                body.description.unwrap_or_default()
            );
            return Ok(None);
        }
        match body.result {
            Some(result) => Ok(Some(result)),
            None => bail!("getMe returned ok=true without a result"),
        }
    }

    /// Errors never carry the request URL, it embeds the token and the message.
    async fn send(&self, token: &str, chat_id: &str, text: &str) -> Result<reqwest::StatusCode> {
        let response = self
            .client
            .get(self.method_url(token, "sendMessage"))
            .query(&[("chat_id", chat_id), ("text", text), ("parse_mode", "HTML")])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("sendMessage request failed")?;
        Ok(response.status())
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn fetch_identity(&self, token: &str) -> Option<Value> {
        match self.get_me(token).await {
            Ok(identity) => identity,
            Err(e) => {
                error!("Error fetching bot info: {:#}", e);
                None
            }
        }
    }

    async fn send_message(&self, token: &str, chat_id: &str, text: &str) -> bool {
        match self.send(token, chat_id, text).await {
            Ok(status) if status == reqwest::StatusCode::OK => true,
            Ok(status) => {
                warn!("sendMessage to {} failed with status {}", chat_id, status);
                false
            }
            Err(e) => {
                error!("Error sending notification: {:#}", e);
                false
            }
        }
    }
}

/// Text sent to the bot owner for every consent visit.
pub fn visit_message(url: &str, ip_address: &str, at: chrono::NaiveDateTime) -> String {
    format!(
        "🔔 New IP\n\nWeb service: {}\nIP address: {}\nTime: {}",
        url,
        ip_address,
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Tell the owner about a visit. Never retried; the result is only logged.
pub async fn notify_owner(
    api: &dyn BotApi,
    bot_token: &str,
    owner_id: &str,
    ip_address: &str,
    url: &str,
) -> bool {
    let text = visit_message(url, ip_address, chrono::Local::now().naive_local());
    let delivered = api.send_message(bot_token, owner_id, &text).await;
    if delivered {
        info!("Notified owner {} about {}", owner_id, ip_address);
    } else {
        warn!("Could not notify owner {} about {}", owner_id, ip_address);
    }
    delivered
}
