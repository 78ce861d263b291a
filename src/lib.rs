//! Pulsar - Segment difficulty and leaderboards for cycling
//!
//! Scores segments with the Pulsar Index, classifies them into climb
//! categories, ranks timed efforts, and aggregates KOM and top-10 placings
//! into the legends board.

pub mod import;
pub mod leaderboards;
pub mod segments;
pub mod storage;

// Re-export commonly used types
pub use leaderboards::{build_leaderboard, rank_effort, LeaderboardService, LegendEntry, RankResult};
pub use segments::{score, score_segment, DifficultyResult, ScoredSegment, Segment};
pub use storage::{AppConfig, Database};
