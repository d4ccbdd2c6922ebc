// Public API for integration tests and potential library usage

pub mod api;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod media;
pub mod seed;
pub mod state;
pub mod store;
pub mod tasks;
pub mod types;
pub mod validation;
