mod connection;
mod helpers;
mod migrations;
pub mod models;
mod repositories;

pub use connection::Database;
pub use helpers::{current_time_millis, validate_quality};
pub use models::{SleepNight, MAX_QUALITY, MIN_QUALITY, UNRATED_QUALITY};
pub use repositories::nights::{NightsSnapshot, NightsSubscription};
