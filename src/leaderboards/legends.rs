//! Legends board: per-user counts of KOMs and top-10 placings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::efforts::{Effort, UserId};
use crate::segments::SegmentId;
use crate::storage::profile::UserProfile;

/// Ranks counted as top-10 placings.
pub const TOP_RANK_CUTOFF: u32 = 10;

/// An effort reduced to what the legends board needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEffort {
    pub user_id: UserId,
    pub rank_global: u32,
}

/// Aggregate placings of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub user_id: UserId,
    pub display_name: String,
    /// Efforts ranked first
    pub count_koms: u32,
    /// Efforts ranked in the top 10, KOMs included
    pub count_top10: u32,
    /// Qualifying efforts; equals `count_top10` and is not deduplicated by segment
    pub total_segments: u32,
}

impl LegendEntry {
    fn new(user: &UserProfile) -> Self {
        Self {
            user_id: user.id,
            display_name: user.display_name.clone(),
            count_koms: 0,
            count_top10: 0,
            total_segments: 0,
        }
    }
}

/// Build the legends board.
///
/// Entries start in `users` order; efforts by users absent from `users` are
/// ignored. Users without a top-10 placing are dropped. The result is sorted
/// by KOMs, then top-10 count, both descending; remaining ties keep their
/// starting order.
pub fn build_leaderboard(efforts: &[RankedEffort], users: &[UserProfile]) -> Vec<LegendEntry> {
    let mut entries: Vec<LegendEntry> = Vec::with_capacity(users.len());
    let mut positions: HashMap<UserId, usize> = HashMap::with_capacity(users.len());

    for user in users {
        if positions.contains_key(&user.id) {
            continue;
        }
        positions.insert(user.id, entries.len());
        entries.push(LegendEntry::new(user));
    }

    let mut unknown = 0usize;
    let mut unranked = 0usize;
    for effort in efforts {
        // Ranks start at 1
        if effort.rank_global == 0 {
            unranked += 1;
            continue;
        }
        let Some(&position) = positions.get(&effort.user_id) else {
            unknown += 1;
            continue;
        };
        let entry = &mut entries[position];

        if effort.rank_global == 1 {
            entry.count_koms += 1;
        }
        if effort.rank_global <= TOP_RANK_CUTOFF {
            entry.count_top10 += 1;
            entry.total_segments += 1;
        }
    }

    if unknown > 0 {
        tracing::warn!(unknown, "Ignored efforts by users without a profile");
    }
    if unranked > 0 {
        tracing::warn!(unranked, "Ignored efforts with rank 0");
    }

    entries.retain(|e| e.count_top10 > 0);
    entries.sort_by(|a, b| {
        b.count_koms
            .cmp(&a.count_koms)
            .then_with(|| b.count_top10.cmp(&a.count_top10))
    });

    entries
}

/// Global rank of every effort, by strict less-than counting within its segment.
pub fn global_ranks(efforts: &[Effort]) -> Vec<RankedEffort> {
    let mut durations: HashMap<SegmentId, Vec<u32>> = HashMap::new();
    for effort in efforts {
        durations.entry(effort.segment_id).or_default().push(effort.duration_s);
    }
    for list in durations.values_mut() {
        list.sort_unstable();
    }

    efforts
        .iter()
        .map(|effort| {
            let faster = durations
                .get(&effort.segment_id)
                .map_or(0, |list| list.partition_point(|&d| d < effort.duration_s));
            RankedEffort {
                user_id: effort.user_id,
                rank_global: faster as u32 + 1,
            }
        })
        .collect()
}
