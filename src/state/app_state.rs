use std::sync::Arc;

use crate::db::bots::BotRepository;
use crate::db::store::JsonStore;
use crate::db::visits::VisitCounter;
use crate::services::hub::BroadcastHub;
use crate::services::telegram::BotApi;
use crate::state::config::AppConfig;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<JsonStore>,
    pub bots: BotRepository,
    pub visits: VisitCounter,
    pub hub: Arc<BroadcastHub>,
    pub telegram: Arc<dyn BotApi>,
}

impl AppState {
    pub fn new(config: AppConfig, store: JsonStore, telegram: Arc<dyn BotApi>) -> Self {
        let store = Arc::new(store);
        Self {
            config,
            bots: BotRepository::new(store.clone()),
            visits: VisitCounter::new(store.clone()),
            store,
            hub: BroadcastHub::new(),
            telegram,
        }
    }
}
