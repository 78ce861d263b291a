//! Unit tests for effort ranking and the legends board

use chrono::Utc;
use pulsar::leaderboards::legends::global_ranks;
use pulsar::leaderboards::{
    build_leaderboard, rank_effort, Effort, MemoryEffortStore, RankedEffort, UserId,
};
use pulsar::segments::SegmentId;
use pulsar::storage::UserProfile;

fn store(efforts: &[(i64, u32)]) -> MemoryEffortStore {
    let now = Utc::now();
    MemoryEffortStore::new(
        efforts
            .iter()
            .map(|&(user, duration)| Effort::new(SegmentId(1), UserId(user), duration, now))
            .collect(),
    )
}

fn ranked(user: i64, rank: u32) -> RankedEffort {
    RankedEffort {
        user_id: UserId(user),
        rank_global: rank,
    }
}

/// Slower efforts never rank ahead of faster ones
#[test]
fn test_rank_monotonic_in_duration() {
    let store = store(&[(1, 420), (2, 380), (3, 380), (4, 500), (1, 395), (5, 610)]);

    let mut previous = 0;
    for duration in 300..700 {
        let rank = rank_effort(&store, SegmentId(1), UserId(9), duration).unwrap();
        assert!(rank.rank_global >= previous);
        previous = rank.rank_global;
    }
}

/// A PR is exactly the absence of a strictly faster own effort
#[test]
fn test_is_pr_iff_no_faster_own_effort() {
    let efforts = [(1, 420), (1, 395), (2, 380), (1, 395)];
    let store = store(&efforts);

    for duration in [300, 394, 395, 396, 420, 421] {
        let rank = rank_effort(&store, SegmentId(1), UserId(1), duration).unwrap();
        let faster_own = efforts.iter().any(|&(u, d)| u == 1 && d < duration);
        assert_eq!(rank.is_pr, !faster_own, "duration {}", duration);
        assert_eq!(rank.is_pr, rank.rank_personal == 1);
    }
}

#[test]
fn test_tied_durations_share_rank() {
    let store = store(&[(1, 300), (2, 300), (3, 300), (4, 310)]);
    let tied = rank_effort(&store, SegmentId(1), UserId(2), 300).unwrap();
    let after = rank_effort(&store, SegmentId(1), UserId(4), 310).unwrap();
    assert_eq!(tied.rank_global, 1);
    assert_eq!(after.rank_global, 4);
}

#[test]
fn test_legends_reference_order() {
    let users = vec![
        UserProfile::new(UserId(1), "A"),
        UserProfile::new(UserId(2), "B"),
        UserProfile::new(UserId(3), "C"),
    ];

    let mut efforts = vec![ranked(1, 1), ranked(1, 1), ranked(1, 8)];
    efforts.extend([ranked(2, 1), ranked(2, 1), ranked(2, 2), ranked(2, 9), ranked(2, 10)]);
    efforts.push(ranked(3, 1));
    efforts.extend((2..=10).map(|r| ranked(3, r)));

    let board = build_leaderboard(&efforts, &users);
    let top10: Vec<u32> = board.iter().map(|e| e.count_top10).collect();
    assert_eq!(top10, vec![5, 3, 10]);
    assert_eq!(board[0].display_name, "B");
    assert!(board.iter().all(|e| e.total_segments == e.count_top10));
}

#[test]
fn test_legends_from_raw_efforts() {
    let now = Utc::now();
    let efforts = vec![
        Effort::new(SegmentId(1), UserId(1), 200, now),
        Effort::new(SegmentId(1), UserId(2), 210, now),
        Effort::new(SegmentId(2), UserId(2), 90, now),
        Effort::new(SegmentId(2), UserId(1), 95, now),
        Effort::new(SegmentId(3), UserId(2), 600, now),
    ];
    let users = vec![UserProfile::new(UserId(1), "One"), UserProfile::new(UserId(2), "Two")];

    let board = build_leaderboard(&global_ranks(&efforts), &users);
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].user_id, UserId(2));
    assert_eq!(board[0].count_koms, 2);
    assert_eq!(board[0].count_top10, 3);
    assert_eq!(board[1].count_koms, 1);
    assert_eq!(board[1].count_top10, 2);
}

#[test]
fn test_legends_empty_inputs() {
    assert!(build_leaderboard(&[], &[]).is_empty());
    assert!(build_leaderboard(&[], &[UserProfile::new(UserId(1), "Idle")]).is_empty());
}
