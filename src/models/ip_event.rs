use serde::{Deserialize, Serialize};

use crate::models::bot::BotRegistration;

/// One accepted consent visit, as pushed to dashboards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IpEvent {
    pub ip_address: String,
    pub bot_username: String,
    pub target_url: String,
    pub timestamp: String,
}

impl IpEvent {
    pub fn new(ip_address: &str, bot: &BotRegistration) -> Self {
        Self {
            ip_address: ip_address.to_string(),
            bot_username: bot.username().to_string(),
            target_url: bot.url.clone(),
            timestamp: chrono::Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
        }
    }

    /// Rebuild the events for every IP a bot has approved so far.
    pub fn history_for(bot: &BotRegistration) -> Vec<Self> {
        bot.approved_ips
            .iter()
            .map(|ip| Self::new(ip, bot))
            .collect()
    }
}
