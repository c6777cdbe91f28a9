use anyhow::Result;
use std::sync::Arc;

use crate::db::store::JsonStore;
use crate::models::visits::{DailyCounts, MAIN_BUCKET, VisitsDocument, today, total};

const VISITS: &str = "visits";

#[derive(Clone)]
pub struct VisitCounter {
    store: Arc<JsonStore>,
}

impl VisitCounter {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    /// Count one visit for today. `None` counts against the landing page.
    pub async fn record_visit(&self, bot_token: Option<&str>) -> Result<VisitsDocument> {
        self.record_visit_on(bot_token, &today()).await
    }

    pub async fn record_visit_on(
        &self,
        bot_token: Option<&str>,
        date: &str,
    ) -> Result<VisitsDocument> {
        let bucket = bot_token.unwrap_or(MAIN_BUCKET);
        self.store
            .update(VISITS, |visits: &mut VisitsDocument| {
                *visits
                    .entry(bucket.to_string())
                    .or_default()
                    .entry(date.to_string())
                    .or_insert(0) += 1;
                visits.clone()
            })
            .await
    }

    pub async fn daily(&self, bucket: &str) -> Result<DailyCounts> {
        let mut visits: VisitsDocument = self.store.load(VISITS).await?;
        Ok(visits.remove(bucket).unwrap_or_default())
    }

    pub async fn total(&self, bucket: &str) -> Result<u64> {
        Ok(total(&self.daily(bucket).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn counter(dir: &tempfile::TempDir) -> VisitCounter {
        VisitCounter::new(Arc::new(JsonStore::open(dir.path()).await.unwrap()))
    }

    #[actix_web::test]
    async fn landing_visits_go_to_main_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let counter = counter(&dir).await;

        let visits = counter.record_visit(None).await.unwrap();
        assert_eq!(visits[MAIN_BUCKET][&today()], 1);
        assert_eq!(counter.total(MAIN_BUCKET).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn counts_only_increase_within_a_day() {
        let dir = tempfile::tempdir().unwrap();
        let counter = counter(&dir).await;

        let mut previous = 0;
        for _ in 0..5 {
            let visits = counter.record_visit_on(Some("T1"), "2024-05-01").await.unwrap();
            let current = visits["T1"]["2024-05-01"];
            assert!(current > previous);
            previous = current;
        }
        assert_eq!(previous, 5);
    }

    #[actix_web::test]
    async fn buckets_and_dates_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let counter = counter(&dir).await;

        counter.record_visit_on(Some("T1"), "2024-05-01").await.unwrap();
        counter.record_visit_on(Some("T1"), "2024-05-02").await.unwrap();
        counter.record_visit_on(None, "2024-05-02").await.unwrap();

        let daily = counter.daily("T1").await.unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(counter.total("T1").await.unwrap(), 2);
        assert_eq!(counter.total(MAIN_BUCKET).await.unwrap(), 1);
        assert!(counter.daily("T2").await.unwrap().is_empty());
    }
}
