//! Ranked views over contest entries and referral records.
//!
//! Both projections sort stably, so entries with equal keys keep the order
//! the store listed them in. Ranks are rewritten on every call.

use crate::types::*;

/// Case-insensitive substring match. Empty filters match everything.
fn matches_filter(value: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(f) => value.to_lowercase().contains(&f.to_lowercase()),
        None => true,
    }
}

/// Filter by language, then region, then sort by `filters.sort_by` and assign
/// 1-based ranks.
pub fn rank_entries(entries: Vec<ContestEntry>, filters: &LeaderboardFilters) -> Vec<ContestEntry> {
    let mut ranked: Vec<ContestEntry> = entries
        .into_iter()
        .filter(|e| matches_filter(&e.language, filters.language.as_deref()))
        .filter(|e| matches_filter(&e.region, filters.region.as_deref()))
        .collect();

    // Vec::sort_by is stable
    match filters.sort_by {
        SortBy::Views => ranked.sort_by(|a, b| b.views.cmp(&a.views)),
        SortBy::Recent => ranked.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortBy::Votes | SortBy::Unrecognized => ranked.sort_by(|a, b| b.votes.cmp(&a.votes)),
    }

    for (index, entry) in ranked.iter_mut().enumerate() {
        entry.rank = index as u32 + 1;
    }
    ranked
}

/// Sort referral records by referral count (descending) and assign ranks.
pub fn rank_referrals(records: Vec<ReferralRecord>) -> Vec<ReferralStanding> {
    let mut records = records;
    records.sort_by(|a, b| b.referral_count.cmp(&a.referral_count));

    records
        .into_iter()
        .enumerate()
        .map(|(index, r)| ReferralStanding {
            rank: index as u32 + 1,
            user_id: r.user_id,
            user_name: r.user_name,
            referral_id: r.referral_id,
            referral_count: r.referral_count,
            raffle_tickets: r.raffle_tickets,
            joined_at: r.created_at,
        })
        .collect()
}
