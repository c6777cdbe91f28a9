use std::collections::BTreeMap;

/// Counter bucket for the landing page.
pub const MAIN_BUCKET: &str = "main";

/// `YYYY-MM-DD` -> visits on that day.
pub type DailyCounts = BTreeMap<String, u64>;

/// The `visits` document: bucket ("main" or a bot token) -> daily counts.
pub type VisitsDocument = BTreeMap<String, DailyCounts>;

pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub fn total(counts: &DailyCounts) -> u64 {
    counts.values().sum()
}
