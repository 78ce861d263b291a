//! Geometry helpers over segment polylines.

use super::TrackPoint;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Minimum horizontal distance covered before a local grade is sampled.
pub const GRADE_WINDOW_M: f64 = 25.0;

/// Calculate horizontal distance between two GPS points (Haversine formula)
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Distance between two track points in meters.
pub fn point_distance(a: &TrackPoint, b: &TrackPoint) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Total haversine length of a polyline.
pub fn polyline_length(points: &[TrackPoint]) -> f64 {
    points.windows(2).map(|w| point_distance(&w[0], &w[1])).sum()
}

/// Highest finite elevation among the usable polyline points.
pub fn peak_elevation(points: &[TrackPoint]) -> Option<f64> {
    points
        .iter()
        .filter(|p| p.is_usable())
        .filter_map(TrackPoint::finite_elevation)
        .fold(None, |max, e| match max {
            Some(m) if m >= e => Some(m),
            _ => Some(e),
        })
}

/// Local grades (percent) sampled every [`GRADE_WINDOW_M`] of travel.
///
/// Distance accumulates from an anchor point; once it reaches the window the
/// grade between the anchor and the current point is recorded and the current
/// point becomes the new anchor. Any trailing stretch shorter than the window
/// is discarded. Points lacking a finite position or elevation are skipped.
pub fn local_grades(points: &[TrackPoint]) -> Vec<f64> {
    let usable: Vec<&TrackPoint> = points.iter().filter(|p| p.is_usable()).collect();
    let mut grades = Vec::new();

    let Some(first) = usable.first() else {
        return grades;
    };

    let mut anchor_elevation = first.finite_elevation().unwrap_or_default();
    let mut accumulated = 0.0;

    for pair in usable.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        accumulated += point_distance(prev, curr);

        if accumulated >= GRADE_WINDOW_M {
            let elevation = curr.finite_elevation().unwrap_or_default();
            grades.push((elevation - anchor_elevation) / accumulated * 100.0);
            anchor_elevation = elevation;
            accumulated = 0.0;
        }
    }

    grades
}

/// Population standard deviation.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}
