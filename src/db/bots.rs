use anyhow::Result;
use std::sync::Arc;

use crate::db::store::JsonStore;
use crate::models::bot::{BotRegistration, BotsDocument};

const BOTS: &str = "bots";

/// Outcome of recording a consent visit against a registered bot.
#[derive(Debug, Clone)]
pub struct ApprovedVisit {
    pub bot: BotRegistration,
    pub newly_approved: bool,
}

#[derive(Clone)]
pub struct BotRepository {
    store: Arc<JsonStore>,
}

impl BotRepository {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, token: &str) -> Result<Option<BotRegistration>> {
        let mut bots: BotsDocument = self.store.load(BOTS).await?;
        Ok(bots.remove(token))
    }

    pub async fn all(&self) -> Result<BotsDocument> {
        self.store.load(BOTS).await
    }

    /// Insert or replace the registration for `token`.
    pub async fn register(&self, token: &str, registration: BotRegistration) -> Result<()> {
        self.store
            .update(BOTS, |bots: &mut BotsDocument| {
                bots.insert(token.to_string(), registration);
            })
            .await
    }

    /// Append `ip` to the bot's approved list if it is new.
    ///
    /// Returns `None` for unknown tokens. Only a new IP rewrites the document.
    pub async fn approve_ip(&self, token: &str, ip: &str) -> Result<Option<ApprovedVisit>> {
        match self.get(token).await? {
            None => return Ok(None),
            Some(bot) if bot.has_ip(ip) => {
                return Ok(Some(ApprovedVisit {
                    bot,
                    newly_approved: false,
                }));
            }
            Some(_) => {}
        }

        self.store
            .update(BOTS, |bots: &mut BotsDocument| {
                bots.get_mut(token).map(|bot| {
                    let newly_approved = bot.approve_ip(ip);
                    ApprovedVisit {
                        bot: bot.clone(),
                        newly_approved,
                    }
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn repository(dir: &tempfile::TempDir) -> BotRepository {
        BotRepository::new(Arc::new(JsonStore::open(dir.path()).await.unwrap()))
    }

    fn registration() -> BotRegistration {
        BotRegistration::new(
            "123".to_string(),
            "https://example.com".to_string(),
            json!({"username": "demo_bot"}),
            "http://localhost/consent/T1".to_string(),
        )
    }

    #[actix_web::test]
    async fn approve_ip_on_unknown_token_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;

        assert!(repo.approve_ip("UNKNOWN", "9.9.9.9").await.unwrap().is_none());
        assert!(!dir.path().join("bots.json").exists());
    }

    #[actix_web::test]
    async fn repeated_ip_is_stored_once() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;
        repo.register("T1", registration()).await.unwrap();

        let first = repo.approve_ip("T1", "9.9.9.9").await.unwrap().unwrap();
        let second = repo.approve_ip("T1", "9.9.9.9").await.unwrap().unwrap();

        assert!(first.newly_approved);
        assert!(!second.newly_approved);
        let stored = repo.get("T1").await.unwrap().unwrap();
        assert_eq!(stored.approved_ips, vec!["9.9.9.9"]);
    }

    #[actix_web::test]
    async fn known_ip_does_not_rewrite_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;
        repo.register("T1", registration()).await.unwrap();
        repo.approve_ip("T1", "9.9.9.9").await.unwrap();

        // Compact JSON on disk; a rewrite would pretty-print it again.
        let path = dir.path().join("bots.json");
        let stored: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let compact = serde_json::to_string(&stored).unwrap();
        std::fs::write(&path, &compact).unwrap();

        let visit = repo.approve_ip("T1", "9.9.9.9").await.unwrap().unwrap();
        assert!(!visit.newly_approved);
        assert_eq!(visit.bot.approved_ips, vec!["9.9.9.9"]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), compact);

        repo.approve_ip("T1", "1.1.1.1").await.unwrap();
        assert_ne!(std::fs::read_to_string(&path).unwrap(), compact);
    }

    #[actix_web::test]
    async fn re_registering_replaces_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;
        repo.register("T1", registration()).await.unwrap();
        repo.approve_ip("T1", "9.9.9.9").await.unwrap();

        repo.register("T1", registration()).await.unwrap();

        let stored = repo.get("T1").await.unwrap().unwrap();
        assert!(stored.approved_ips.is_empty());
        assert_eq!(repo.all().await.unwrap().len(), 1);
    }
}
