//! Effort ranking and the database-backed leaderboard service.
//!
//! Ranks count strictly faster efforts: tied durations share a rank and the
//! following rank is not renumbered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::efforts::{Effort, EffortStore, UserId};
use super::legends::{build_leaderboard, global_ranks, LegendEntry};
use crate::segments::SegmentId;
use crate::storage::config::LeaderboardSettings;
use crate::storage::{Database, DatabaseError};

/// Rank of a single effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankResult {
    /// 1 + efforts on the segment strictly faster
    pub rank_global: u32,
    /// 1 + the user's own efforts on the segment strictly faster
    pub rank_personal: u32,
    pub is_pr: bool,
}

impl RankResult {
    pub fn is_kom(&self) -> bool {
        self.rank_global == 1
    }
}

/// Rank an effort of `duration_s` by `user_id` on `segment_id`.
///
/// Store failures are returned to the caller; no rank is guessed.
pub fn rank_effort<S: EffortStore>(
    store: &S,
    segment_id: SegmentId,
    user_id: UserId,
    duration_s: u32,
) -> Result<RankResult, LeaderboardError> {
    let rank_global = store.count_faster(segment_id, None, duration_s)? + 1;
    let rank_personal = store.count_faster(segment_id, Some(user_id), duration_s)? + 1;

    tracing::debug!(
        %segment_id,
        %user_id,
        duration_s,
        rank_global,
        rank_personal,
        "Ranked effort"
    );

    Ok(RankResult {
        rank_global,
        rank_personal,
        is_pr: rank_personal == 1,
    })
}

/// One row of a segment leaderboard: a user's best time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentBoardEntry {
    pub rank: u32,
    pub user_id: UserId,
    pub display_name: String,
    pub best_duration_s: u32,
    pub started_at: DateTime<Utc>,
}

/// A user's best effort on one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    pub segment_id: SegmentId,
    pub segment_name: String,
    pub duration_s: u32,
    pub started_at: DateTime<Utc>,
    pub rank_global: u32,
}

/// Leaderboard service over the database.
pub struct LeaderboardService {
    db: Arc<Database>,
    settings: LeaderboardSettings,
}

impl LeaderboardService {
    /// Create a new leaderboard service.
    pub fn new(db: Arc<Database>, settings: LeaderboardSettings) -> Self {
        Self { db, settings }
    }

    /// Rank a (possibly hypothetical) effort against stored efforts.
    pub fn rank_effort(
        &self,
        segment_id: SegmentId,
        user_id: UserId,
        duration_s: u32,
    ) -> Result<RankResult, LeaderboardError> {
        rank_effort(self.db.as_ref(), segment_id, user_id, duration_s)
    }

    /// Store an effort, then rank it.
    pub fn record_effort(&self, effort: &Effort) -> Result<RankResult, LeaderboardError> {
        if self.db.get_segment(effort.segment_id)?.is_none() {
            return Err(LeaderboardError::SegmentNotFound(effort.segment_id));
        }

        self.db.insert_effort(effort)?;
        let rank = self.rank_effort(effort.segment_id, effort.user_id, effort.duration_s)?;

        if rank.is_kom() {
            tracing::info!(segment_id = %effort.segment_id, user_id = %effort.user_id, "New KOM");
        }

        Ok(rank)
    }

    /// Legends board over every stored effort and user.
    pub fn legends(&self) -> Result<Vec<LegendEntry>, LeaderboardError> {
        let users = self.db.list_users()?;
        let efforts = self.db.list_efforts()?;
        let ranked = global_ranks(&efforts);

        tracing::debug!(users = users.len(), efforts = efforts.len(), "Building legends board");
        Ok(build_leaderboard(&ranked, &users))
    }

    /// Best time per user on a segment, fastest first.
    pub fn segment_leaderboard(
        &self,
        segment_id: SegmentId,
    ) -> Result<Vec<SegmentBoardEntry>, LeaderboardError> {
        if self.db.get_segment(segment_id)?.is_none() {
            return Err(LeaderboardError::SegmentNotFound(segment_id));
        }

        let bests = self.db.best_efforts(segment_id, self.settings.segment_limit)?;

        let mut entries: Vec<SegmentBoardEntry> = Vec::with_capacity(bests.len());
        for (position, best) in bests.into_iter().enumerate() {
            // Equal bests share the rank of the first of them
            let rank = match entries.last() {
                Some(prev) if prev.best_duration_s == best.duration_s => prev.rank,
                _ => position as u32 + 1,
            };
            entries.push(SegmentBoardEntry {
                rank,
                user_id: best.user_id,
                display_name: best.display_name,
                best_duration_s: best.duration_s,
                started_at: best.started_at,
            });
        }

        Ok(entries)
    }

    /// Personal records of a user, one per attempted segment.
    pub fn personal_records(&self, user_id: UserId) -> Result<Vec<PersonalRecord>, LeaderboardError> {
        let bests = self.db.personal_bests(user_id)?;

        bests
            .into_iter()
            .map(|best| -> Result<PersonalRecord, LeaderboardError> {
                let rank_global = self.db.count_faster(best.segment_id, None, best.duration_s)? + 1;
                Ok(PersonalRecord {
                    segment_id: best.segment_id,
                    segment_name: best.segment_name,
                    duration_s: best.duration_s,
                    started_at: best.started_at,
                    rank_global,
                })
            })
            .collect()
    }
}

/// Leaderboard errors.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("Segment not found: {0}")]
    SegmentNotFound(SegmentId),

    #[error("Effort store unavailable: {0}")]
    Store(String),
}

impl From<DatabaseError> for LeaderboardError {
    fn from(e: DatabaseError) -> Self {
        LeaderboardError::Store(e.to_string())
    }
}
