//! Leaderboards module
//!
//! Provides effort ranking, personal records, the legends board, and export.

pub mod efforts;
pub mod export;
pub mod legends;
pub mod rankings;

// Re-export commonly used types
pub use efforts::{Effort, EffortStore, MemoryEffortStore, UserId};
pub use legends::{build_leaderboard, LegendEntry, RankedEffort};
pub use rankings::{rank_effort, LeaderboardError, LeaderboardService, RankResult};
