mod contest;
pub mod export;
mod referral;

use crate::config::AppConfig;
use crate::store::{EntryStore, MemoryStore, ReferralStore};
use crate::validation::SubmissionValidator;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub entries: Arc<dyn EntryStore>,
    pub referrals: Arc<dyn ReferralStore>,
    pub config: Arc<AppConfig>,
    validator: Arc<SubmissionValidator>,
    started_at: Instant,
}

impl AppState {
    /// State backed by a fresh in-memory store
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(config, store.clone(), store)
    }

    /// State backed by caller-provided stores
    pub fn with_stores(
        config: AppConfig,
        entries: Arc<dyn EntryStore>,
        referrals: Arc<dyn ReferralStore>,
    ) -> Self {
        let validator = Arc::new(SubmissionValidator::new(config.contest.clone()));
        Self {
            entries,
            referrals,
            config: Arc::new(config),
            validator,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
