//! Integration tests for GPX segment import and scoring

use pulsar::import::{import_gpx_file, ImportError};
use pulsar::segments::{score, score_all, score_segment, Segment, SegmentId, TrackPoint};
use pulsar::storage::Database;
use std::io::Write;

/// A 1.1 km climb sampled every ~55 m at a steady 8%
fn climb_gpx() -> String {
    let mut gpx = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk>
    <name>Côte pavée de Test</name>
    <trkseg>
"#,
    );
    let step_m = 55.597;
    for i in 0..=20 {
        let lat = 50.0 + i as f64 * 0.0005;
        let ele = 40.0 + i as f64 * step_m * 0.08;
        gpx.push_str(&format!(
            "      <trkpt lat=\"{:.4}\" lon=\"3.0\"><ele>{:.3}</ele></trkpt>\n",
            lat, ele
        ));
    }
    gpx.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    gpx
}

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".gpx").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_import_climb() {
    let file = write_temp(&climb_gpx());
    let segment = import_gpx_file(file.path(), SegmentId(12), None).unwrap();

    assert_eq!(segment.id, SegmentId(12));
    assert_eq!(segment.name, "Côte pavée de Test");
    assert_eq!(segment.polyline.len(), 21);
    assert!((segment.distance_m - 1_112.0).abs() < 1.0, "got {}", segment.distance_m);
    assert!((segment.elevation_gain_m - 88.96).abs() < 0.1, "got {}", segment.elevation_gain_m);
    assert!((segment.average_grade - 8.0).abs() < 0.05, "got {}", segment.average_grade);
    assert!((segment.max_grade.unwrap() - 8.0).abs() < 0.05);

    // A steady grade gives near-zero variance
    let result = score(&segment);
    assert!(result.sigma < 0.05, "got {}", result.sigma);

    let scored = score_segment(&segment);
    assert_eq!(scored.surface_tags, vec!["PAVÉS"]);
}

#[test]
fn test_import_name_override() {
    let file = write_temp(&climb_gpx());
    let segment = import_gpx_file(file.path(), SegmentId(1), Some("Custom".to_string())).unwrap();
    assert_eq!(segment.name, "Custom");
}

#[test]
fn test_import_missing_file() {
    let result = import_gpx_file(std::path::Path::new("/nonexistent/track.gpx"), SegmentId(1), None);
    assert!(matches!(result, Err(ImportError::IoError(_))));
}

#[test]
fn test_imported_segment_scores_identically_after_storage() {
    let file = write_temp(&climb_gpx());
    let segment = import_gpx_file(file.path(), SegmentId(5), None).unwrap();

    let db = Database::open_in_memory().unwrap();
    db.upsert_segment(&segment).unwrap();
    let stored = db.get_segment(SegmentId(5)).unwrap().unwrap();

    assert_eq!(score(&stored), score(&segment));
    let batch = score_all(&db.list_segments().unwrap());
    assert_eq!(batch[0], score_segment(&segment));
}

#[test]
fn test_random_climbs_score_identically_after_storage() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(2024);
    let db = Database::open_in_memory().unwrap();

    let mut segments = Vec::new();
    for id in 0..100 {
        let mut lat = rng.gen_range(40.0..50.0);
        let lon = rng.gen_range(0.0..10.0);
        let mut elevation = rng.gen_range(100.0..2000.0);
        let mut polyline = Vec::with_capacity(60);
        for _ in 0..60 {
            polyline.push(TrackPoint::new(lat, lon, Some(elevation)));
            lat += rng.gen_range(0.0001..0.0006);
            elevation += rng.gen_range(-2.0..9.0);
        }

        let segment = Segment::new(
            SegmentId(id),
            format!("Climb {}", id),
            rng.gen_range(1000.0..8000.0),
            rng.gen_range(50.0..900.0),
            rng.gen_range(2.0..12.0),
        )
        .with_polyline(polyline);
        db.upsert_segment(&segment).unwrap();
        segments.push(segment);
    }

    for segment in &segments {
        let stored = db.get_segment(segment.id).unwrap().unwrap();
        assert_eq!(score(&stored), score(segment), "segment {}", segment.id);
    }
}
