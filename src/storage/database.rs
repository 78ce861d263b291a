//! Database operations using rusqlite.
//!
//! Stores users, segments and efforts, and answers the strict less-than
//! counts the ranker needs.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::leaderboards::efforts::{Effort, EffortStore, UserId};
use crate::leaderboards::rankings::LeaderboardError;
use crate::segments::{Segment, SegmentId, SegmentTag, TrackPoint};
use crate::storage::profile::UserProfile;
use crate::storage::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Connection,
}

/// A user's best time on a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct BestEffortRow {
    pub user_id: UserId,
    pub display_name: String,
    pub duration_s: u32,
    pub started_at: DateTime<Utc>,
}

/// A user's best time on one of the segments they attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalBestRow {
    pub segment_id: SegmentId,
    pub segment_name: String,
    pub duration_s: u32,
    pub started_at: DateTime<Utc>,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        tracing::debug!(path = %path.display(), "Opened database");
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        self.conn
            .execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = self.get_schema_version()?;

        if current_version < CURRENT_VERSION {
            self.migrate(current_version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    pub fn get_schema_version(&self) -> Result<i32, DatabaseError> {
        let result: SqliteResult<i32> = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        );

        match result {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Run database migrations.
    fn migrate(&self, from_version: i32) -> Result<(), DatabaseError> {
        if from_version < 1 {
            self.conn
                .execute_batch(SCHEMA)
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            self.conn
                .execute(
                    "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
                    [CURRENT_VERSION],
                )
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            tracing::info!("Database migrated to version {}", CURRENT_VERSION);
        }

        Ok(())
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Users ==========

    /// Insert or replace a user profile.
    pub fn upsert_user(&self, profile: &UserProfile) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO users (id, display_name, avatar_url, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    display_name = excluded.display_name,
                    avatar_url = excluded.avatar_url",
                params![
                    profile.id.0,
                    profile.display_name,
                    profile.avatar_url,
                    profile.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Get a user profile by ID.
    pub fn get_user(&self, id: UserId) -> Result<Option<UserProfile>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, display_name, avatar_url, created_at FROM users WHERE id = ?1",
                params![id.0],
                UserRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        row.map(UserRow::into_profile).transpose()
    }

    /// All user profiles, oldest first.
    pub fn list_users(&self) -> Result<Vec<UserProfile>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, display_name, avatar_url, created_at FROM users ORDER BY created_at, id")
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], UserRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut users = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            users.push(row.into_profile()?);
        }

        Ok(users)
    }

    // ========== Segments ==========

    /// Insert or replace a segment.
    pub fn upsert_segment(&self, segment: &Segment) -> Result<(), DatabaseError> {
        let polyline_json = serde_json::to_string(&segment.polyline)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
        let tags_json = serde_json::to_string(&segment.tags)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO segments (id, name, category, distance_m, elevation_gain_m,
                 average_grade, max_grade, polyline_json, tags_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    category = excluded.category,
                    distance_m = excluded.distance_m,
                    elevation_gain_m = excluded.elevation_gain_m,
                    average_grade = excluded.average_grade,
                    max_grade = excluded.max_grade,
                    polyline_json = excluded.polyline_json,
                    tags_json = excluded.tags_json",
                params![
                    segment.id.0,
                    segment.name,
                    segment.category,
                    segment.distance_m,
                    segment.elevation_gain_m,
                    segment.average_grade,
                    segment.max_grade,
                    polyline_json,
                    tags_json,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Get a segment by ID.
    pub fn get_segment(&self, id: SegmentId) -> Result<Option<Segment>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, category, distance_m, elevation_gain_m, average_grade,
                 max_grade, polyline_json, tags_json
                 FROM segments WHERE id = ?1",
                params![id.0],
                SegmentRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        row.map(SegmentRow::into_segment).transpose()
    }

    /// All segments ordered by ID.
    pub fn list_segments(&self) -> Result<Vec<Segment>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, category, distance_m, elevation_gain_m, average_grade,
                 max_grade, polyline_json, tags_json
                 FROM segments ORDER BY id",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], SegmentRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut segments = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            segments.push(row.into_segment()?);
        }

        Ok(segments)
    }

    // ========== Efforts ==========

    /// Insert an effort.
    pub fn insert_effort(&self, effort: &Effort) -> Result<(), DatabaseError> {
        insert_effort_with(&self.conn, effort)
    }

    /// Insert many efforts in one transaction.
    pub fn insert_efforts(&self, efforts: &[Effort]) -> Result<usize, DatabaseError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        for effort in efforts {
            insert_effort_with(&tx, effort)?;
        }

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tracing::debug!(count = efforts.len(), "Inserted efforts");
        Ok(efforts.len())
    }

    /// All efforts, oldest first.
    pub fn list_efforts(&self) -> Result<Vec<Effort>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, segment_id, user_id, duration_s, started_at
                 FROM efforts ORDER BY started_at, id",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(EffortRow {
                    id: row.get(0)?,
                    segment_id: row.get(1)?,
                    user_id: row.get(2)?,
                    duration_s: row.get(3)?,
                    started_at: row.get(4)?,
                })
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut efforts = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            efforts.push(row.into_effort()?);
        }

        Ok(efforts)
    }

    /// Count efforts on a segment strictly faster than `duration_s`.
    pub fn count_efforts_faster(
        &self,
        segment_id: SegmentId,
        user_id: Option<UserId>,
        duration_s: u32,
    ) -> Result<u32, DatabaseError> {
        let result: SqliteResult<u32> = match user_id {
            Some(user) => self.conn.query_row(
                "SELECT COUNT(*) FROM efforts
                 WHERE segment_id = ?1 AND user_id = ?2 AND duration_s < ?3",
                params![segment_id.0, user.0, duration_s],
                |row| row.get(0),
            ),
            None => self.conn.query_row(
                "SELECT COUNT(*) FROM efforts
                 WHERE segment_id = ?1 AND duration_s < ?2",
                params![segment_id.0, duration_s],
                |row| row.get(0),
            ),
        };

        result.map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    /// Each user's best effort on a segment, fastest first.
    pub fn best_efforts(&self, segment_id: SegmentId, limit: usize) -> Result<Vec<BestEffortRow>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT e.user_id, u.display_name, MIN(e.duration_s) AS best_time, e.started_at
                 FROM efforts e
                 LEFT JOIN users u ON e.user_id = u.id
                 WHERE e.segment_id = ?1
                 GROUP BY e.user_id
                 ORDER BY best_time ASC, e.user_id ASC
                 LIMIT ?2",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![segment_id.0, limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut bests = Vec::new();
        for row in rows {
            let (user_id, display_name, duration_s, started_at) =
                row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            bests.push(BestEffortRow {
                user_id: UserId(user_id),
                display_name: display_name.unwrap_or_else(|| "Unknown".to_string()),
                duration_s,
                started_at: parse_timestamp(&started_at)?,
            });
        }

        Ok(bests)
    }

    /// A user's best effort on every segment they attempted.
    pub fn personal_bests(&self, user_id: UserId) -> Result<Vec<PersonalBestRow>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT e.segment_id, s.name, MIN(e.duration_s) AS best_time, e.started_at
                 FROM efforts e
                 JOIN segments s ON e.segment_id = s.id
                 WHERE e.user_id = ?1
                 GROUP BY e.segment_id
                 ORDER BY e.segment_id",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.0], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut bests = Vec::new();
        for row in rows {
            let (segment_id, segment_name, duration_s, started_at) =
                row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            bests.push(PersonalBestRow {
                segment_id: SegmentId(segment_id),
                segment_name,
                duration_s,
                started_at: parse_timestamp(&started_at)?,
            });
        }

        Ok(bests)
    }
}

impl EffortStore for Database {
    fn count_faster(
        &self,
        segment_id: SegmentId,
        user_id: Option<UserId>,
        duration_s: u32,
    ) -> Result<u32, LeaderboardError> {
        Ok(self.count_efforts_faster(segment_id, user_id, duration_s)?)
    }
}

fn insert_effort_with(conn: &Connection, effort: &Effort) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO efforts (id, segment_id, user_id, duration_s, started_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            effort.id.to_string(),
            effort.segment_id.0,
            effort.user_id.0,
            effort.duration_s,
            effort.started_at.to_rfc3339(),
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(msg.unwrap_or_else(|| err.to_string()))
        }
        other => DatabaseError::QueryFailed(other.to_string()),
    })?;

    Ok(())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid timestamp: {}", e)))
}

/// Helper struct for reading user rows.
struct UserRow {
    id: i64,
    display_name: String,
    avatar_url: Option<String>,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            display_name: row.get(1)?,
            avatar_url: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn into_profile(self) -> Result<UserProfile, DatabaseError> {
        Ok(UserProfile {
            id: UserId(self.id),
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Helper struct for reading segment rows.
struct SegmentRow {
    id: i64,
    name: String,
    category: Option<String>,
    distance_m: f64,
    elevation_gain_m: f64,
    average_grade: f64,
    max_grade: Option<f64>,
    polyline_json: String,
    tags_json: String,
}

impl SegmentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            distance_m: row.get(3)?,
            elevation_gain_m: row.get(4)?,
            average_grade: row.get(5)?,
            max_grade: row.get(6)?,
            polyline_json: row.get(7)?,
            tags_json: row.get(8)?,
        })
    }

    fn into_segment(self) -> Result<Segment, DatabaseError> {
        let polyline: Vec<TrackPoint> = serde_json::from_str(&self.polyline_json).map_err(|e| {
            DatabaseError::DeserializationError(format!("Invalid polyline JSON: {}", e))
        })?;
        let tags: Vec<SegmentTag> = serde_json::from_str(&self.tags_json)
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid tags JSON: {}", e)))?;

        Ok(Segment {
            id: SegmentId(self.id),
            name: self.name,
            category: self.category,
            distance_m: self.distance_m,
            elevation_gain_m: self.elevation_gain_m,
            average_grade: self.average_grade,
            max_grade: self.max_grade,
            polyline,
            tags,
        })
    }
}

/// Helper struct for reading effort rows.
struct EffortRow {
    id: String,
    segment_id: i64,
    user_id: i64,
    duration_s: u32,
    started_at: String,
}

impl EffortRow {
    fn into_effort(self) -> Result<Effort, DatabaseError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?;

        Ok(Effort {
            id,
            segment_id: SegmentId(self.segment_id),
            user_id: UserId(self.user_id),
            duration_s: self.duration_s,
            started_at: parse_timestamp(&self.started_at)?,
        })
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}
