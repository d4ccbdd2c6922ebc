//! Runtime configuration loaded from environment variables.

use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;

/// Limits applied to contest submissions
#[derive(Debug, Clone)]
pub struct ContestConfig {
    pub max_video_bytes: u64,
    pub max_video_seconds: u64,
    pub max_caption_chars: usize,
    /// Prefix for content-addressed video references
    pub media_base_url: String,
}

impl Default for ContestConfig {
    fn default() -> Self {
        Self {
            max_video_bytes: 50 * 1024 * 1024,
            max_video_seconds: 60,
            max_caption_chars: 200,
            media_base_url: "/media".to_string(),
        }
    }
}

/// How many raffle tickets a redeemed referral is worth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketPolicy {
    pub min: u64,
    pub max: u64,
}

impl Default for TicketPolicy {
    fn default() -> Self {
        Self { min: 1, max: 5 }
    }
}

impl TicketPolicy {
    /// Always award exactly `n` tickets
    pub fn fixed(n: u64) -> Self {
        Self { min: n, max: n }
    }

    /// Inclusive range; `max` is clamped up to `min`
    pub fn range(min: u64, max: u64) -> Self {
        if max < min {
            tracing::warn!(
                "Ticket range is inverted (min {}, max {}), awarding {} tickets",
                min,
                max,
                min
            );
        }
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn draw(&self) -> u64 {
        if self.min >= self.max {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Base URL referral links point at
    pub public_url: String,
    pub contest: ContestConfig,
    pub tickets: TicketPolicy,
    /// Where to persist state snapshots (None = in-memory only)
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_interval: Duration,
    /// Load the demo leaderboard at startup
    pub seed_demo: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            public_url: "https://languagekonnect.com".to_string(),
            contest: ContestConfig::default(),
            tickets: TicketPolicy::default(),
            snapshot_path: None,
            snapshot_interval: Duration::from_secs(60),
            seed_demo: false,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parsed_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match non_empty_var(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}

fn flag_var(key: &str) -> bool {
    non_empty_var(key)
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

impl AppConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let contest_defaults = ContestConfig::default();
        let ticket_defaults = TicketPolicy::default();

        let contest = ContestConfig {
            max_video_bytes: parsed_var("KONNECT_MAX_VIDEO_BYTES", contest_defaults.max_video_bytes),
            max_video_seconds: parsed_var(
                "KONNECT_MAX_VIDEO_SECONDS",
                contest_defaults.max_video_seconds,
            ),
            max_caption_chars: parsed_var(
                "KONNECT_MAX_CAPTION_CHARS",
                contest_defaults.max_caption_chars,
            ),
            media_base_url: non_empty_var("KONNECT_MEDIA_BASE_URL")
                .unwrap_or(contest_defaults.media_base_url),
        };

        let tickets = TicketPolicy::range(
            parsed_var("KONNECT_TICKETS_MIN", ticket_defaults.min),
            parsed_var("KONNECT_TICKETS_MAX", ticket_defaults.max),
        );

        let config = Self {
            port: parsed_var("KONNECT_PORT", defaults.port),
            public_url: non_empty_var("KONNECT_PUBLIC_URL").unwrap_or(defaults.public_url),
            contest,
            tickets,
            snapshot_path: non_empty_var("KONNECT_SNAPSHOT_PATH").map(PathBuf::from),
            snapshot_interval: Duration::from_secs(parsed_var(
                "KONNECT_SNAPSHOT_INTERVAL",
                defaults.snapshot_interval.as_secs(),
            )),
            seed_demo: flag_var("KONNECT_SEED_DEMO"),
        };

        tracing::info!(
            port = config.port,
            max_video_bytes = config.contest.max_video_bytes,
            max_video_seconds = config.contest.max_video_seconds,
            tickets_min = config.tickets.min,
            tickets_max = config.tickets.max,
            snapshot = config.snapshot_path.is_some(),
            "Config loaded"
        );
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "KONNECT_PORT",
        "KONNECT_PUBLIC_URL",
        "KONNECT_MEDIA_BASE_URL",
        "KONNECT_MAX_VIDEO_BYTES",
        "KONNECT_MAX_VIDEO_SECONDS",
        "KONNECT_MAX_CAPTION_CHARS",
        "KONNECT_TICKETS_MIN",
        "KONNECT_TICKETS_MAX",
        "KONNECT_SNAPSHOT_PATH",
        "KONNECT_SNAPSHOT_INTERVAL",
        "KONNECT_SEED_DEMO",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    fn set(key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = AppConfig::from_env();
        assert_eq!(config.port, 3000);
        assert_eq!(config.contest.max_video_bytes, 50 * 1024 * 1024);
        assert_eq!(config.contest.max_video_seconds, 60);
        assert_eq!(config.contest.max_caption_chars, 200);
        assert_eq!(config.tickets, TicketPolicy { min: 1, max: 5 });
        assert!(config.snapshot_path.is_none());
        assert!(!config.seed_demo);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        set("KONNECT_PORT", "8080");
        set("KONNECT_TICKETS_MIN", "2");
        set("KONNECT_TICKETS_MAX", "2");
        set("KONNECT_SNAPSHOT_PATH", "/tmp/konnect.json");
        set("KONNECT_SEED_DEMO", "true");

        let config = AppConfig::from_env();
        assert_eq!(config.port, 8080);
        assert_eq!(config.tickets, TicketPolicy::fixed(2));
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/konnect.json")));
        assert!(config.seed_demo);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        set("KONNECT_PORT", "not-a-port");
        set("KONNECT_SEED_DEMO", "0");
        let config = AppConfig::from_env();
        assert_eq!(config.port, 3000);
        assert!(!config.seed_demo);
        clear_env();
    }

    #[test]
    fn test_ticket_policy_draw_in_range() {
        let policy = TicketPolicy::default();
        for _ in 0..200 {
            let n = policy.draw();
            assert!((1..=5).contains(&n));
        }
        assert_eq!(TicketPolicy::fixed(3).draw(), 3);
        assert_eq!(TicketPolicy::range(4, 1), TicketPolicy::fixed(4));
    }

    #[test]
    #[serial]
    fn test_inverted_ticket_range_from_env() {
        clear_env();
        set("KONNECT_TICKETS_MIN", "6");
        set("KONNECT_TICKETS_MAX", "2");
        let config = AppConfig::from_env();
        assert_eq!(config.tickets, TicketPolicy::fixed(6));
        clear_env();
    }
}
