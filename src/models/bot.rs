use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The `bots` document: bot token -> registration.
pub type BotsDocument = BTreeMap<String, BotRegistration>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BotRegistration {
    pub telegram_id: String, // Owner's chat id, receives the notifications
    pub url: String,         // Where the visitor is sent after the consent page
    pub info: Value,         // Raw `getMe` payload captured at registration
    pub created_at: String,  // ISO-8601, server local time
    pub consent_url: String,
    #[serde(default)]
    pub approved_ips: Vec<String>, // First-seen order, no duplicates
}

impl BotRegistration {
    pub fn new(telegram_id: String, url: String, info: Value, consent_url: String) -> Self {
        Self {
            telegram_id,
            url,
            info,
            created_at: chrono::Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            consent_url,
            approved_ips: Vec::new(),
        }
    }

    pub fn username(&self) -> &str {
        self.info_str("username").unwrap_or_default()
    }

    pub fn first_name(&self) -> &str {
        self.info_str("first_name").unwrap_or_default()
    }

    pub fn has_ip(&self, ip: &str) -> bool {
        self.approved_ips.iter().any(|known| known == ip)
    }

    /// Returns true when the IP was not seen before and got appended.
    pub fn approve_ip(&mut self, ip: &str) -> bool {
        if self.has_ip(ip) {
            return false;
        }
        self.approved_ips.push(ip.to_string());
        true
    }

    fn info_str(&self, key: &str) -> Option<&str> {
        self.info.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> BotRegistration {
        BotRegistration::new(
            "123".to_string(),
            "https://example.com".to_string(),
            json!({"id": 42, "is_bot": true, "first_name": "Demo", "username": "demo_bot"}),
            "http://localhost:5000/consent/T1".to_string(),
        )
    }

    #[test]
    fn approve_ip_suppresses_duplicates_and_keeps_order() {
        let mut bot = sample();
        assert!(bot.approve_ip("9.9.9.9"));
        assert!(bot.approve_ip("1.1.1.1"));
        assert!(!bot.approve_ip("9.9.9.9"));
        assert_eq!(bot.approved_ips, vec!["9.9.9.9", "1.1.1.1"]);
    }

    #[test]
    fn identity_fields_are_read_from_info() {
        let bot = sample();
        assert_eq!(bot.username(), "demo_bot");
        assert_eq!(bot.first_name(), "Demo");

        let mut anonymous = sample();
        anonymous.info = json!({});
        assert_eq!(anonymous.username(), "");
    }

    #[test]
    fn serializes_with_stored_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        for field in ["telegram_id", "url", "info", "created_at", "consent_url", "approved_ips"] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
    }
}
