//! Storage module for database and configuration.

pub mod config;
pub mod database;
pub mod profile;
pub mod schema;

pub use config::{AppConfig, ConfigError, LeaderboardSettings};
pub use database::{Database, DatabaseError};
pub use profile::UserProfile;
