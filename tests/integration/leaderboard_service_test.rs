//! Integration tests for the database-backed leaderboard service

use chrono::{TimeZone, Utc};
use pulsar::leaderboards::{Effort, LeaderboardError, LeaderboardService, UserId};
use pulsar::segments::{Segment, SegmentId};
use pulsar::storage::{Database, LeaderboardSettings, UserProfile};
use std::sync::Arc;

fn setup(limit: usize) -> (Arc<Database>, LeaderboardService) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to create database"));
    db.upsert_segment(&Segment::new(SegmentId(1), "Alpe d'Huez", 13_800.0, 1_071.0, 8.1))
        .unwrap();
    db.upsert_segment(&Segment::new(SegmentId(2), "Poggio", 3_700.0, 136.0, 3.7))
        .unwrap();
    for (id, name) in [(1, "Pantani"), (2, "Armstrong"), (3, "Ullrich")] {
        db.upsert_user(&UserProfile::new(UserId(id), name)).unwrap();
    }

    let service = LeaderboardService::new(db.clone(), LeaderboardSettings { segment_limit: limit });
    (db, service)
}

fn effort(segment: i64, user: i64, duration: u32, day: u32) -> Effort {
    Effort::new(
        SegmentId(segment),
        UserId(user),
        duration,
        Utc.with_ymd_and_hms(2024, 7, day, 10, 0, 0).unwrap(),
    )
}

#[test]
fn test_record_effort_ranks_against_history() {
    let (_db, service) = setup(10);

    let first = service.record_effort(&effort(1, 1, 2_240, 1)).unwrap();
    assert_eq!((first.rank_global, first.rank_personal, first.is_pr), (1, 1, true));

    let slower = service.record_effort(&effort(1, 2, 2_300, 2)).unwrap();
    assert_eq!((slower.rank_global, slower.rank_personal, slower.is_pr), (2, 1, true));

    let tie = service.record_effort(&effort(1, 3, 2_240, 3)).unwrap();
    assert_eq!(tie.rank_global, 1);

    let repeat = service.record_effort(&effort(1, 1, 2_400, 4)).unwrap();
    assert_eq!((repeat.rank_global, repeat.rank_personal, repeat.is_pr), (4, 2, false));
}

#[test]
fn test_record_effort_on_unknown_segment() {
    let (_db, service) = setup(10);
    let result = service.record_effort(&effort(99, 1, 100, 1));
    assert!(matches!(result, Err(LeaderboardError::SegmentNotFound(SegmentId(99)))));
}

#[test]
fn test_rank_effort_does_not_record() {
    let (db, service) = setup(10);
    service.record_effort(&effort(2, 1, 330, 1)).unwrap();

    let rank = service.rank_effort(SegmentId(2), UserId(2), 320).unwrap();
    assert_eq!(rank.rank_global, 1);
    assert_eq!(db.list_efforts().unwrap().len(), 1);
}

#[test]
fn test_legends_over_database() {
    let (db, service) = setup(10);
    db.insert_efforts(&[
        effort(1, 1, 2_240, 1),
        effort(1, 2, 2_300, 2),
        effort(2, 2, 320, 3),
        effort(2, 1, 330, 4),
        effort(2, 3, 340, 5),
    ])
    .unwrap();

    let legends = service.legends().unwrap();
    let rows: Vec<(i64, u32, u32)> = legends
        .iter()
        .map(|e| (e.user_id.0, e.count_koms, e.count_top10))
        .collect();
    // Pantani and Armstrong tie on (1, 2); user order breaks the tie
    assert_eq!(rows, vec![(1, 1, 2), (2, 1, 2), (3, 0, 1)]);
}

#[test]
fn test_segment_leaderboard_best_per_user() {
    let (db, service) = setup(2);
    db.insert_efforts(&[
        effort(2, 1, 330, 1),
        effort(2, 1, 318, 2),
        effort(2, 2, 318, 3),
        effort(2, 3, 301, 4),
    ])
    .unwrap();

    let board = service.segment_leaderboard(SegmentId(2)).unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].user_id, UserId(3));
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[1].best_duration_s, 318);
    assert_eq!(board[1].rank, 2);

    let (db, service) = setup(10);
    db.insert_efforts(&[effort(2, 1, 318, 1), effort(2, 2, 318, 2), effort(2, 3, 400, 3)])
        .unwrap();
    let ranks: Vec<u32> = service
        .segment_leaderboard(SegmentId(2))
        .unwrap()
        .iter()
        .map(|e| e.rank)
        .collect();
    assert_eq!(ranks, vec![1, 1, 3]);
}

#[test]
fn test_personal_records() {
    let (db, service) = setup(10);
    db.insert_efforts(&[
        effort(1, 1, 2_500, 1),
        effort(1, 1, 2_350, 2),
        effort(1, 2, 2_300, 3),
        effort(2, 1, 310, 4),
    ])
    .unwrap();

    let records = service.personal_records(UserId(1)).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].segment_name, "Alpe d'Huez");
    assert_eq!(records[0].duration_s, 2_350);
    assert_eq!(records[0].rank_global, 2);
    assert_eq!(records[1].rank_global, 1);

    assert!(service.personal_records(UserId(3)).unwrap().is_empty());
}
