//! Integration test modules.

mod leaderboard_service_test;
mod segment_import_test;
