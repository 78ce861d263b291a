//! Segment efforts and the stores that count them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::rankings::LeaderboardError;
use crate::segments::SegmentId;

/// User identifier (the provider's athlete id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One user's timed traversal of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effort {
    pub id: Uuid,
    pub segment_id: SegmentId,
    pub user_id: UserId,
    /// Elapsed time in seconds
    pub duration_s: u32,
    pub started_at: DateTime<Utc>,
}

impl Effort {
    /// Create a new effort with a fresh id.
    pub fn new(segment_id: SegmentId, user_id: UserId, duration_s: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id,
            user_id,
            duration_s,
            started_at,
        }
    }
}

/// Source of effort counts for ranking.
pub trait EffortStore {
    /// Count efforts on `segment_id` strictly faster than `duration_s`,
    /// restricted to `user_id` when given.
    fn count_faster(
        &self,
        segment_id: SegmentId,
        user_id: Option<UserId>,
        duration_s: u32,
    ) -> Result<u32, LeaderboardError>;
}

impl<S: EffortStore + ?Sized> EffortStore for &S {
    fn count_faster(
        &self,
        segment_id: SegmentId,
        user_id: Option<UserId>,
        duration_s: u32,
    ) -> Result<u32, LeaderboardError> {
        (**self).count_faster(segment_id, user_id, duration_s)
    }
}

/// Effort store over an in-memory list.
#[derive(Debug, Clone, Default)]
pub struct MemoryEffortStore {
    efforts: Vec<Effort>,
}

impl MemoryEffortStore {
    pub fn new(efforts: Vec<Effort>) -> Self {
        Self { efforts }
    }

    pub fn push(&mut self, effort: Effort) {
        self.efforts.push(effort);
    }

    pub fn efforts(&self) -> &[Effort] {
        &self.efforts
    }

    pub fn len(&self) -> usize {
        self.efforts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.efforts.is_empty()
    }
}

impl EffortStore for MemoryEffortStore {
    fn count_faster(
        &self,
        segment_id: SegmentId,
        user_id: Option<UserId>,
        duration_s: u32,
    ) -> Result<u32, LeaderboardError> {
        let count = self
            .efforts
            .iter()
            .filter(|e| e.segment_id == segment_id)
            .filter(|e| user_id.map_or(true, |u| e.user_id == u))
            .filter(|e| e.duration_s < duration_s)
            .count();

        Ok(count as u32)
    }
}
