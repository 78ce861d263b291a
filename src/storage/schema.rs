//! Database schema definitions for Pulsar.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    display_name TEXT NOT NULL,
    avatar_url TEXT,
    created_at TEXT NOT NULL
);

-- Segments table
CREATE TABLE IF NOT EXISTS segments (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT,
    distance_m REAL NOT NULL,
    elevation_gain_m REAL NOT NULL,
    average_grade REAL NOT NULL,
    max_grade REAL,
    polyline_json TEXT NOT NULL,
    tags_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Efforts table
CREATE TABLE IF NOT EXISTS efforts (
    id TEXT PRIMARY KEY,
    segment_id INTEGER NOT NULL REFERENCES segments(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL,
    duration_s INTEGER NOT NULL CHECK (duration_s > 0),
    started_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_efforts_segment_duration ON efforts(segment_id, duration_s);
CREATE INDEX IF NOT EXISTS idx_efforts_segment_user_duration ON efforts(segment_id, user_id, duration_s);
CREATE INDEX IF NOT EXISTS idx_efforts_user ON efforts(user_id);
"#;

/// Schema version table.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;
