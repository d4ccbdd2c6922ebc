use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type EntryId = String;
pub type UserId = String;
pub type ReferralId = String;

/// Languages a contest entry can be submitted in
pub const LANGUAGES: &[&str] = &[
    "English",
    "Spanish",
    "French",
    "German",
    "Italian",
    "Portuguese",
    "Russian",
    "Chinese",
    "Japanese",
    "Korean",
    "Arabic",
    "Hindi",
    "Dutch",
    "Swedish",
    "Norwegian",
    "Danish",
    "Finnish",
    "Polish",
];

/// Regions a contest entry can be submitted from
pub const REGIONS: &[&str] = &[
    "North America",
    "South America",
    "Europe",
    "Asia",
    "Africa",
    "Oceania",
    "Middle East",
    "Caribbean",
    "Central America",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContestEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub user_name: String,
    pub language: String,
    pub region: String,
    pub caption: String,
    pub video_url: String,
    /// Hex SHA-256 of the uploaded bytes
    #[serde(default)]
    pub video_digest: String,
    pub votes: u64,
    #[serde(default)]
    pub views: u64,
    pub created_at: DateTime<Utc>,
    /// Position in the last computed leaderboard view (0 = never ranked)
    #[serde(default)]
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRecord {
    pub user_id: UserId,
    #[serde(default)]
    pub user_name: String,
    pub referral_id: ReferralId,
    pub referral_count: u64,
    pub raffle_tickets: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_referral_at: Option<DateTime<Utc>>,
}

/// Leaderboard sort key. Unknown keys deserialize to `Votes`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Votes,
    Views,
    Recent,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardFilters {
    #[serde(default)]
    pub sort_by: SortBy,
    pub language: Option<String>,
    pub region: Option<String>,
}

/// One row of the referral leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStanding {
    pub rank: u32,
    pub user_id: UserId,
    pub user_name: String,
    pub referral_id: ReferralId,
    pub referral_count: u64,
    pub raffle_tickets: u64,
    pub joined_at: DateTime<Utc>,
}

/// A user's referral record as shown to that user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralProfile {
    #[serde(flatten)]
    pub record: ReferralRecord,
    pub referral_link: String,
}

/// Result of redeeming a referral identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaffleReceipt {
    pub ticket_count: u64,
    pub tickets_added: u64,
    pub message: String,
}

/// Identity the calling browser claims for itself.
///
/// The browser keeps its own user id in local storage and sends it with each
/// request. It is never authenticated; it only exists so operations that care
/// about "who is asking" (self-referral, entry ownership) get it explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientContext {
    pub user_id: Option<UserId>,
    pub display_name: Option<String>,
}

impl ClientContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            display_name: None,
        }
    }
}

/// Friendly name for users who never told us theirs
pub fn generated_display_name() -> String {
    petname::petname(2, " ").unwrap_or_else(|| "New User".to_string())
}

/// Match a free-form value against an enumerated set, case-insensitively.
/// Returns the canonical spelling.
pub fn canonical_option(options: &[&'static str], value: &str) -> Option<&'static str> {
    let value = value.trim();
    options
        .iter()
        .copied()
        .find(|o| o.eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_parsing() {
        let parse = |s: &str| serde_json::from_str::<SortBy>(&format!("\"{s}\"")).unwrap();
        assert_eq!(parse("votes"), SortBy::Votes);
        assert_eq!(parse("views"), SortBy::Views);
        assert_eq!(parse("recent"), SortBy::Recent);
        assert_eq!(parse("top-rated"), SortBy::Unrecognized);
    }

    #[test]
    fn test_canonical_option() {
        assert_eq!(canonical_option(LANGUAGES, "spanish"), Some("Spanish"));
        assert_eq!(canonical_option(REGIONS, " middle east "), Some("Middle East"));
        assert_eq!(canonical_option(LANGUAGES, "Klingon"), None);
    }

    #[test]
    fn test_profile_flattens_record() {
        let profile = ReferralProfile {
            record: ReferralRecord {
                user_id: "u1".to_string(),
                user_name: "Alex Thompson".to_string(),
                referral_id: "abc".to_string(),
                referral_count: 2,
                raffle_tickets: 7,
                created_at: Utc::now(),
                last_referral_at: None,
            },
            referral_link: "https://example.com?ref=abc".to_string(),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["referralId"], "abc");
        assert_eq!(json["raffleTickets"], 7);
        assert_eq!(json["userName"], "Alex Thompson");
        assert_eq!(json["referralLink"], "https://example.com?ref=abc");
    }
}
