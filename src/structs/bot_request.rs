use serde::Deserialize;
use url::Url;
use validator::Validate;

/// Registration form posted to `/submit`.
#[derive(Deserialize, Validate)]
pub struct SubmitBotRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub bot_token: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub telegram_id: String,
    #[serde(default)]
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,
}

impl SubmitBotRequest {
    pub fn trimmed(self) -> Self {
        Self {
            bot_token: self.bot_token.trim().to_string(),
            telegram_id: self.telegram_id.trim().to_string(),
            url: self.url.trim().to_string(),
        }
    }

    pub fn has_missing_fields(&self) -> bool {
        [&self.bot_token, &self.telegram_id, &self.url]
            .iter()
            .any(|field| field.is_empty())
    }

    /// Visitors are sent to `url` by script, so only web pages are accepted.
    pub fn has_web_url(&self) -> bool {
        Url::parse(&self.url)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(bot_token: &str, telegram_id: &str, url: &str) -> SubmitBotRequest {
        SubmitBotRequest {
            bot_token: bot_token.to_string(),
            telegram_id: telegram_id.to_string(),
            url: url.to_string(),
        }
        .trimmed()
    }

    #[test]
    fn blank_fields_are_missing() {
        assert!(request("T1", "  ", "https://example.com").has_missing_fields());
        assert!(!request("T1", "123", "https://example.com").has_missing_fields());
    }

    #[test]
    fn url_must_be_well_formed() {
        assert!(request("T1", "123", "https://example.com").validate().is_ok());
        assert!(request("T1", "123", "not a url").validate().is_err());
    }

    #[test]
    fn only_http_and_https_targets_are_web_urls() {
        assert!(request("T1", "123", "https://example.com").has_web_url());
        assert!(request("T1", "123", "HTTP://example.com/path").has_web_url());
        assert!(!request("T1", "123", "javascript:alert(document.domain)").has_web_url());
        assert!(!request("T1", "123", "data:text/html,<script>1</script>").has_web_url());
        assert!(!request("T1", "123", "ftp://example.com").has_web_url());
    }
}
