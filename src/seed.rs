//! Demo data for local development (`KONNECT_SEED_DEMO=1`).

use crate::state::export::StateSnapshot;
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

/// (name, language, region, caption, votes, views, submitted)
const DEMO_ENTRIES: &[(&str, &str, &str, &str, u64, u64, (i32, u32, u32))] = &[
    ("Maria Garcia", "Spanish", "South America", "Sharing my love for Spanish poetry!", 245, 1200, (2024, 1, 15)),
    ("Chen Wei", "Chinese", "Asia", "Traditional Chinese calligraphy demonstration", 198, 890, (2024, 1, 14)),
    ("Ahmed Hassan", "Arabic", "Middle East", "Classical Arabic literature recitation", 167, 750, (2024, 1, 13)),
    ("Sophie Laurent", "French", "Europe", "French pronunciation masterclass", 134, 620, (2024, 1, 12)),
    ("Raj Patel", "Hindi", "Asia", "Bollywood dialogue delivery", 112, 540, (2024, 1, 11)),
];

/// (user, referrals, joined)
const DEMO_REFERRERS: &[(&str, u64, (i32, u32, u32))] = &[
    ("Alex Thompson", 47, (2023, 12, 1)),
    ("Sarah Kim", 38, (2023, 11, 15)),
    ("Miguel Rodriguez", 31, (2023, 11, 20)),
    ("Emma Wilson", 24, (2023, 12, 5)),
    ("David Chen", 19, (2023, 12, 10)),
    ("Lisa Anderson", 15, (2023, 12, 12)),
    ("James Miller", 12, (2023, 12, 15)),
    ("Anna Kowalski", 8, (2023, 12, 18)),
];

pub fn demo_entries() -> Vec<ContestEntry> {
    DEMO_ENTRIES
        .iter()
        .enumerate()
        .map(|(i, (name, language, region, caption, votes, views, (y, m, d)))| ContestEntry {
            id: format!("demo_entry_{}", i + 1),
            user_id: format!("demo_user_{}", i + 1),
            user_name: name.to_string(),
            language: language.to_string(),
            region: region.to_string(),
            caption: caption.to_string(),
            video_url: "/api/placeholder-video".to_string(),
            video_digest: String::new(),
            votes: *votes,
            views: *views,
            created_at: day(*y, *m, *d),
            rank: 0,
        })
        .collect()
}

pub fn demo_referrals() -> Vec<ReferralRecord> {
    DEMO_REFERRERS
        .iter()
        .enumerate()
        .map(|(i, (name, count, (y, m, d)))| ReferralRecord {
            user_id: name.to_lowercase().replace(' ', "_"),
            user_name: name.to_string(),
            referral_id: format!("demoref{:09}", i + 1),
            referral_count: *count,
            raffle_tickets: count * 2,
            created_at: day(*y, *m, *d),
            last_referral_at: None,
        })
        .collect()
}

pub fn demo_snapshot() -> StateSnapshot {
    StateSnapshot::new(demo_entries(), demo_referrals())
}
