use super::AppState;
use crate::error::AppResult;
use crate::leaderboard::rank_entries;
use crate::types::*;
use crate::validation::SubmissionCandidate;

impl AppState {
    /// Validate a submission and store the resulting entry
    pub async fn submit_entry(
        &self,
        candidate: SubmissionCandidate,
        ctx: &ClientContext,
    ) -> AppResult<ContestEntry> {
        let video_size = candidate.video.as_ref().map(|v| v.size).unwrap_or(0);

        let entry = match self.validator.validate(candidate, ctx) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(code = e.code(), "Rejected contest submission: {}", e);
                return Err(e.into());
            }
        };

        self.entries.put(entry.clone()).await?;

        tracing::info!(
            entry_id = %entry.id,
            language = %entry.language,
            region = %entry.region,
            video_bytes = video_size,
            "Contest entry submitted"
        );
        Ok(entry)
    }

    /// Ranked, filtered view of all contest entries
    pub async fn query_leaderboard(&self, filters: &LeaderboardFilters) -> AppResult<Vec<ContestEntry>> {
        let entries = self.entries.list().await?;
        let ranked = rank_entries(entries, filters);
        tracing::debug!(
            sort_by = ?filters.sort_by,
            language = ?filters.language,
            region = ?filters.region,
            count = ranked.len(),
            "Leaderboard queried"
        );
        Ok(ranked)
    }

    pub async fn get_entry(&self, id: &str) -> AppResult<Option<ContestEntry>> {
        Ok(self.entries.get(id).await?)
    }
}
