//! Storage seam for contest entries and referral records.
//!
//! Handlers never touch collections directly; they go through these traits so
//! tests (and a future database) can swap the backing store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::types::*;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<ContestEntry>>;

    /// Insert or replace an entry. New entries keep insertion order in `list`.
    async fn put(&self, entry: ContestEntry) -> StoreResult<()>;

    /// All entries in insertion order
    async fn list(&self) -> StoreResult<Vec<ContestEntry>>;
}

#[async_trait]
pub trait ReferralStore: Send + Sync {
    async fn get(&self, user_id: &str) -> StoreResult<Option<ReferralRecord>>;

    async fn find_by_referral_id(&self, referral_id: &str) -> StoreResult<Option<ReferralRecord>>;

    /// Insert or replace the record owned by `record.user_id`
    async fn put(&self, record: ReferralRecord) -> StoreResult<()>;

    /// All records in creation order
    async fn list(&self) -> StoreResult<Vec<ReferralRecord>>;
}

/// In-process store backed by vectors, so listing preserves insertion order
/// (the leaderboards break ties by it).
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<ContestEntry>>,
    referrals: RwLock<Vec<ReferralRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn get(&self, id: &str) -> StoreResult<Option<ContestEntry>> {
        Ok(self.entries.read().await.iter().find(|e| e.id == id).cloned())
    }

    async fn put(&self, entry: ContestEntry) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<ContestEntry>> {
        Ok(self.entries.read().await.clone())
    }
}

#[async_trait]
impl ReferralStore for MemoryStore {
    async fn get(&self, user_id: &str) -> StoreResult<Option<ReferralRecord>> {
        Ok(self
            .referrals
            .read()
            .await
            .iter()
            .find(|r| r.user_id == user_id)
            .cloned())
    }

    async fn find_by_referral_id(&self, referral_id: &str) -> StoreResult<Option<ReferralRecord>> {
        Ok(self
            .referrals
            .read()
            .await
            .iter()
            .find(|r| r.referral_id == referral_id)
            .cloned())
    }

    async fn put(&self, record: ReferralRecord) -> StoreResult<()> {
        let mut referrals = self.referrals.write().await;
        match referrals.iter_mut().find(|r| r.user_id == record.user_id) {
            Some(existing) => *existing = record,
            None => referrals.push(record),
        }
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<ReferralRecord>> {
        Ok(self.referrals.read().await.clone())
    }
}
