//! State export/import.
//!
//! The stores live in memory; a snapshot is the whole of it as one JSON
//! document. Snapshots back the export/import endpoints and the optional
//! snapshot file written in the background.

use super::AppState;
use crate::error::{AppError, AppResult};
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Schema version for export format compatibility
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub schema_version: u32,
    pub exported_at: DateTime<Utc>,
    /// Entries in store order
    pub entries: Vec<ContestEntry>,
    /// Referral records in store order
    pub referrals: Vec<ReferralRecord>,
}

impl StateSnapshot {
    pub fn new(entries: Vec<ContestEntry>, referrals: Vec<ReferralRecord>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION,
            exported_at: Utc::now(),
            entries,
            referrals,
        }
    }

    /// Validate the snapshot before import
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version > EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Snapshot schema version {} is newer than supported version {}. \
                 Please update the server.",
                self.schema_version, EXPORT_SCHEMA_VERSION
            ));
        }

        let mut entry_ids = HashSet::new();
        for entry in &self.entries {
            if !entry_ids.insert(entry.id.as_str()) {
                return Err(format!("Duplicate entry id '{}'", entry.id));
            }
        }

        let mut users = HashSet::new();
        let mut referral_ids = HashSet::new();
        for record in &self.referrals {
            if record.user_id.is_empty() || record.referral_id.is_empty() {
                return Err("Referral record with empty user or referral id".to_string());
            }
            if !users.insert(record.user_id.as_str()) {
                return Err(format!("Duplicate referral record for user '{}'", record.user_id));
            }
            if !referral_ids.insert(record.referral_id.as_str()) {
                return Err(format!("Duplicate referral id '{}'", record.referral_id));
            }
        }

        Ok(())
    }
}

impl AppState {
    pub async fn export_state(&self) -> AppResult<StateSnapshot> {
        Ok(StateSnapshot::new(
            self.entries.list().await?,
            self.referrals.list().await?,
        ))
    }

    /// Upsert every entry and referral record of the snapshot.
    pub async fn import_state(&self, snapshot: StateSnapshot) -> AppResult<()> {
        snapshot.validate().map_err(AppError::MalformedPayload)?;

        // A referral id may not move to a different owner
        for record in &snapshot.referrals {
            if let Some(existing) = self.referrals.find_by_referral_id(&record.referral_id).await? {
                if existing.user_id != record.user_id {
                    return Err(AppError::MalformedPayload(format!(
                        "Referral id '{}' already belongs to another user",
                        record.referral_id
                    )));
                }
            }
        }

        let (entry_count, referral_count) = (snapshot.entries.len(), snapshot.referrals.len());
        for mut entry in snapshot.entries {
            entry.rank = 0;
            self.entries.put(entry).await?;
        }
        for record in snapshot.referrals {
            self.referrals.put(record).await?;
        }

        tracing::info!(entry_count, referral_count, "State imported");
        Ok(())
    }

    /// Write a snapshot to `path` (via a temp file, then rename).
    pub async fn save_snapshot(&self, path: &Path) -> AppResult<()> {
        let snapshot = self.export_state().await?;
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| AppError::Unavailable(format!("snapshot encoding failed: {e}")))?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| AppError::Unavailable(format!("writing {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| AppError::Unavailable(format!("renaming to {}: {e}", path.display())))?;
        Ok(())
    }

    /// Import the snapshot at `path`. Returns false if the file doesn't exist.
    pub async fn load_snapshot(&self, path: &Path) -> AppResult<bool> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(AppError::Unavailable(format!(
                    "reading {}: {e}",
                    path.display()
                )))
            }
        };

        let snapshot: StateSnapshot = serde_json::from_slice(&raw)
            .map_err(|e| AppError::MalformedPayload(format!("{}: {e}", path.display())))?;
        self.import_state(snapshot).await?;
        Ok(true)
    }
}
