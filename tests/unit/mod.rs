//! Unit test modules.

mod difficulty_test;
mod leaderboard_test;
