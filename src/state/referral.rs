use super::AppState;
use crate::error::{AppError, AppResult, ValidationError};
use crate::leaderboard::rank_referrals;
use crate::types::*;
use chrono::Utc;
use rand::Rng;

/// Lowercase alphanumerics, URL-safe without escaping
const REFERRAL_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
/// 36^16 ≈ 2^82 possible identifiers
const REFERRAL_ID_LENGTH: usize = 16;

fn generate_referral_id() -> ReferralId {
    let mut rng = rand::rng();
    (0..REFERRAL_ID_LENGTH)
        .map(|_| REFERRAL_CHARS[rng.random_range(0..REFERRAL_CHARS.len())] as char)
        .collect()
}

impl AppState {
    /// Get the user's referral record, creating it on first visit.
    ///
    /// `display_name` is only used when the record is created; without one the
    /// user gets a generated name.
    pub async fn create_or_fetch_referral(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> AppResult<ReferralRecord> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ValidationError::MissingField("userId").into());
        }

        if let Some(existing) = self.referrals.get(user_id).await? {
            return Ok(existing);
        }

        // Generate a unique referral id (check for collisions)
        let referral_id = loop {
            let id = generate_referral_id();
            if self.referrals.find_by_referral_id(&id).await?.is_none() {
                break id;
            }
        };

        let user_name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(generated_display_name);

        let record = ReferralRecord {
            user_id: user_id.to_string(),
            user_name,
            referral_id,
            referral_count: 0,
            raffle_tickets: 0,
            created_at: Utc::now(),
            last_referral_at: None,
        };
        self.referrals.put(record.clone()).await?;

        tracing::info!(user_id, referral_id = %record.referral_id, "Referral identity created");
        Ok(record)
    }

    /// Referral record plus the shareable link
    pub async fn referral_profile(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> AppResult<ReferralProfile> {
        let record = self.create_or_fetch_referral(user_id, display_name).await?;
        let referral_link = format!(
            "{}?ref={}",
            self.config.public_url.trim_end_matches('/'),
            record.referral_id
        );
        Ok(ReferralProfile {
            record,
            referral_link,
        })
    }

    /// Credit the owner of `referral_id` with one referral and a ticket award.
    ///
    /// `redeemer` is whoever followed the link; redeeming your own identifier
    /// is rejected.
    pub async fn record_referral(
        &self,
        referral_id: &str,
        redeemer: &ClientContext,
    ) -> AppResult<RaffleReceipt> {
        let referral_id = referral_id.trim();
        if referral_id.is_empty() {
            return Err(ValidationError::MissingField("referralId").into());
        }

        let mut record = self
            .referrals
            .find_by_referral_id(referral_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(referral_id, "Unknown referral id");
                AppError::NotFound(format!("referral id {referral_id}"))
            })?;

        if redeemer.user_id.as_deref() == Some(record.user_id.as_str()) {
            tracing::warn!(referral_id, user_id = %record.user_id, "Self-referral rejected");
            return Err(AppError::InvalidReferral(
                "cannot redeem your own referral link".to_string(),
            ));
        }

        let tickets_added = self.config.tickets.draw();
        record.referral_count += 1;
        record.raffle_tickets += tickets_added;
        record.last_referral_at = Some(Utc::now());
        self.referrals.put(record.clone()).await?;

        tracing::info!(
            referral_id,
            tickets_added,
            ticket_count = record.raffle_tickets,
            "Referral recorded"
        );

        Ok(RaffleReceipt {
            ticket_count: record.raffle_tickets,
            tickets_added,
            message: format!("Added {tickets_added} raffle tickets!"),
        })
    }

    /// All referral records ranked by referral count
    pub async fn referral_leaderboard(&self) -> AppResult<Vec<ReferralStanding>> {
        Ok(rank_referrals(self.referrals.list().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::{down_state, state_with_tickets};

    #[test]
    fn test_generated_ids_shape() {
        let id = generate_referral_id();
        assert_eq!(id.len(), REFERRAL_ID_LENGTH);
        assert!(id.bytes().all(|b| REFERRAL_CHARS.contains(&b)));
        assert_ne!(generate_referral_id(), generate_referral_id());
    }

    #[tokio::test]
    async fn test_create_or_fetch_is_idempotent() {
        let state = AppState::default();
        let first = state.create_or_fetch_referral("alice", None).await.unwrap();
        let second = state.create_or_fetch_referral("alice", None).await.unwrap();

        assert_eq!(first.referral_id, second.referral_id);
        assert_eq!(first.referral_count, 0);
        assert_eq!(first.raffle_tickets, 0);
        assert_eq!(state.referral_leaderboard().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_users_get_distinct_ids() {
        let state = AppState::default();
        let a = state.create_or_fetch_referral("alice", None).await.unwrap();
        let b = state.create_or_fetch_referral("bob", None).await.unwrap();
        assert_ne!(a.referral_id, b.referral_id);
    }

    #[tokio::test]
    async fn test_empty_user_id_rejected() {
        let state = AppState::default();
        let err = state.create_or_fetch_referral("  ", None).await.unwrap_err();
        assert_eq!(err.code(), "MISSING_FIELD");
    }

    #[tokio::test]
    async fn test_record_referral_updates_balance() {
        let state = state_with_tickets(3);
        let alice = state.create_or_fetch_referral("alice", None).await.unwrap();

        let receipt = state
            .record_referral(&alice.referral_id, &ClientContext::for_user("bob"))
            .await
            .unwrap();
        assert_eq!(receipt.tickets_added, 3);
        assert_eq!(receipt.ticket_count, 3);
        assert_eq!(receipt.message, "Added 3 raffle tickets!");

        let receipt = state
            .record_referral(&alice.referral_id, &ClientContext::anonymous())
            .await
            .unwrap();
        assert_eq!(receipt.ticket_count, 6);

        let record = state.create_or_fetch_referral("alice", None).await.unwrap();
        assert_eq!(record.referral_count, 2);
        assert_eq!(record.raffle_tickets, 6);
        assert_eq!(record.referral_id, alice.referral_id);
        assert!(record.last_referral_at.is_some());
    }

    #[tokio::test]
    async fn test_default_policy_awards_one_to_five() {
        let state = AppState::default();
        let alice = state.create_or_fetch_referral("alice", None).await.unwrap();
        let mut previous = 0;
        for _ in 0..20 {
            let receipt = state
                .record_referral(&alice.referral_id, &ClientContext::anonymous())
                .await
                .unwrap();
            assert!((1..=5).contains(&receipt.tickets_added));
            assert_eq!(receipt.ticket_count, previous + receipt.tickets_added);
            previous = receipt.ticket_count;
        }
    }

    #[tokio::test]
    async fn test_unknown_referral_is_not_found_and_changes_nothing() {
        let state = state_with_tickets(2);
        state.create_or_fetch_referral("alice", None).await.unwrap();
        let before = state.referrals.list().await.unwrap();

        let err = state
            .record_referral("doesnotexist", &ClientContext::for_user("bob"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(state.referrals.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_self_referral_rejected() {
        let state = state_with_tickets(2);
        let alice = state.create_or_fetch_referral("alice", None).await.unwrap();

        let err = state
            .record_referral(&alice.referral_id, &ClientContext::for_user("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidReferral(_)));

        let record = state.create_or_fetch_referral("alice", None).await.unwrap();
        assert_eq!(record.referral_count, 0);
        assert_eq!(record.raffle_tickets, 0);
    }

    #[tokio::test]
    async fn test_profile_link() {
        let state = AppState::default();
        let profile = state.referral_profile("alice", None).await.unwrap();
        assert_eq!(
            profile.referral_link,
            format!("https://languagekonnect.com?ref={}", profile.record.referral_id)
        );
    }

    #[tokio::test]
    async fn test_referral_leaderboard_ranks_by_count() {
        let state = state_with_tickets(1);
        let alice = state
            .create_or_fetch_referral("alice", Some("Alice Liddell"))
            .await
            .unwrap();
        let bob = state
            .create_or_fetch_referral("bob", Some("Bob Marley"))
            .await
            .unwrap();
        state.create_or_fetch_referral("carol", None).await.unwrap();

        for _ in 0..2 {
            state
                .record_referral(&bob.referral_id, &ClientContext::anonymous())
                .await
                .unwrap();
        }
        state
            .record_referral(&alice.referral_id, &ClientContext::anonymous())
            .await
            .unwrap();

        let board = state.referral_leaderboard().await.unwrap();
        let users: Vec<_> = board.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(users, vec!["bob", "alice", "carol"]);
        assert_eq!(board.iter().map(|s| s.rank).collect::<Vec<_>>(), vec![1, 2, 3]);

        assert_eq!(board[0].user_name, "Bob Marley");
        assert_eq!(board[0].joined_at, bob.created_at);
        assert_eq!(board[1].user_name, "Alice Liddell");
        assert!(!board[2].user_name.is_empty());
    }

    #[tokio::test]
    async fn test_display_name_is_kept_from_first_visit() {
        let state = AppState::default();
        state
            .create_or_fetch_referral("alice", Some("  Alice  "))
            .await
            .unwrap();
        let again = state
            .create_or_fetch_referral("alice", Some("Someone Else"))
            .await
            .unwrap();
        assert_eq!(again.user_name, "Alice");
    }

    #[tokio::test]
    async fn test_ledger_unavailable() {
        let state = down_state();
        let err = state
            .record_referral("abc", &ClientContext::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
    }
}
