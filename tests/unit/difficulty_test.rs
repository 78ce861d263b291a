//! Unit tests for the Pulsar Index and climb categories

use pulsar::segments::difficulty::ScoringInputs;
use pulsar::segments::{score, score_segment, ClimbCategory, Segment, SegmentId, TrackPoint};

fn segment(distance: f64, gain: f64, grade: f64) -> Segment {
    Segment::new(SegmentId(1), "Test", distance, gain, grade)
}

/// Worked example: 1000 m over 20 km at 5%
#[test]
fn test_reference_segment() {
    let seg = segment(20_000.0, 1000.0, 5.0);
    let inputs = ScoringInputs::from_segment(&seg);

    assert_eq!(inputs.base(), 4000.0);
    assert_eq!(inputs.oxygen(), 1.125);
    assert!((inputs.pivot() - 0.928).abs() < 1e-12);

    let result = score(&seg);
    assert_eq!(result.index, 4176);
    assert_eq!(result.sigma, 1.2);
    assert_eq!(score_segment(&seg).category_label, "CAT 2");
}

#[test]
fn test_non_positive_gain_uses_one_meter() {
    for gain in [0.0, -10.0, -0.5] {
        let inputs = ScoringInputs::from_segment(&segment(5000.0, gain, 2.0));
        assert_eq!(inputs.elevation_gain_m, 1.0);
    }
}

#[test]
fn test_short_segment_uses_hundred_meters() {
    for distance in [0.0, 50.0, 100.0] {
        let inputs = ScoringInputs::from_segment(&segment(distance, 10.0, 2.0));
        assert_eq!(inputs.distance_m, 100.0);
    }
    assert_eq!(score(&segment(40.0, 10.0, 2.0)), score(&segment(100.0, 10.0, 2.0)));
}

#[test]
fn test_index_non_decreasing_in_elevation_gain() {
    for grade in [0.0, 2.0, 5.0, 8.0, 12.0, 20.0] {
        let mut previous = i64::MIN;
        for step in 0..200 {
            let gain = step as f64 * 7.5 - 20.0;
            let index = score(&segment(6000.0, gain, grade)).index;
            assert!(index >= previous, "grade {} gain {}: {} < {}", grade, gain, index, previous);
            previous = index;
        }

        // Gains large enough to overflow the formula saturate instead of wrapping
        for gain in [1e50, 1e100, 1e110, 1e200, f64::MAX] {
            let index = score(&segment(6000.0, gain, grade)).index;
            assert!(index >= previous, "grade {} gain {}: {} < {}", grade, gain, index, previous);
            previous = index;
        }
        assert_eq!(previous, i64::MAX);
    }
}

#[test]
fn test_index_non_decreasing_with_fixed_polyline() {
    let polyline: Vec<TrackPoint> = (0..12)
        .map(|i| TrackPoint::new(45.0 + i as f64 * 0.0004, 6.0, Some(1200.0 + (i % 3) as f64 * 4.0)))
        .collect();

    let mut previous = i64::MIN;
    for step in 0..100 {
        let seg = segment(3000.0, step as f64 * 10.0, 6.0).with_polyline(polyline.clone());
        let index = score(&seg).index;
        assert!(index >= previous);
        previous = index;
    }
}

#[test]
fn test_every_index_has_one_category() {
    for index in -2_000..12_000 {
        let category = ClimbCategory::from_index(index);
        let expected = if index > 7500 {
            ClimbCategory::Iconic
        } else if index > 6500 {
            ClimbCategory::HorsCategorie
        } else if index > 5000 {
            ClimbCategory::Cat1
        } else if index > 3000 {
            ClimbCategory::Cat2
        } else if index > 1500 {
            ClimbCategory::Cat3
        } else if index > 1000 {
            ClimbCategory::Cat4
        } else if index > 500 {
            ClimbCategory::RegionalClimb
        } else {
            ClimbCategory::Flat
        };
        assert_eq!(category, expected, "index {}", index);
    }
}

#[test]
fn test_sparse_polyline_falls_back() {
    let points = vec![
        TrackPoint::new(45.0, 6.0, Some(400.0)),
        TrackPoint::new(45.001, 6.0, Some(420.0)),
        TrackPoint::new(45.002, 6.0, None),
        TrackPoint::new(f64::NAN, 6.0, Some(430.0)),
        TrackPoint::new(45.003, 6.0, Some(440.0)),
        TrackPoint::new(45.004, 6.0, Some(460.0)),
        TrackPoint::new(45.005, 6.0, Some(480.0)),
    ];
    // Five usable points: not enough for the variance walk
    let result = score(&segment(500.0, 80.0, 16.0).with_polyline(points));
    assert_eq!(result.sigma, 1.2);
}

#[test]
fn test_surface_and_manual_tags() {
    let seg = segment(12_000.0, 150.0, 1.2)
        .with_category("Gravel")
        .with_tag(pulsar::segments::SegmentTag::new("Training", "#22c55e"));

    let scored = score_segment(&seg);
    assert_eq!(scored.surface_tags, vec!["GRAVEL", "Training"]);
    assert_eq!(scored.tags.len(), 2);
}

#[test]
fn test_mythic_loop_overrides_index() {
    let seg = segment(120_000.0, 2500.0, 2.0);
    let scored = score_segment(&seg);
    assert!(scored.density < 30.0);
    assert!(scored.index > 7500);
    assert_eq!(scored.category, ClimbCategory::MythicLoop);
}
