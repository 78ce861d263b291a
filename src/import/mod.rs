//! Segment import from GPS files.
//!
//! Builds a [`Segment`] with its polyline and the derived distance, elevation
//! gain and grades from a recorded track.

pub mod gpx;

use std::path::Path;
use thiserror::Error;

use crate::segments::geo;
use crate::segments::{Segment, SegmentId, TrackPoint};

/// Import errors.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Track has {0} points, at least 2 required")]
    TooFewPoints(usize),
}

/// Geometry summary of a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSummary {
    pub distance_m: f64,
    pub elevation_gain_m: f64,
    pub average_grade: f64,
    pub max_grade: Option<f64>,
}

impl TrackSummary {
    /// Summarize a polyline.
    ///
    /// Elevation gain sums positive deltas between consecutive points with a
    /// known elevation. Average grade uses the first and last known
    /// elevations; max grade is the steepest 25 m local grade.
    pub fn from_points(points: &[TrackPoint]) -> Self {
        let distance_m = geo::polyline_length(points);

        let elevations: Vec<f64> = points.iter().filter_map(TrackPoint::finite_elevation).collect();
        let elevation_gain_m = elevations
            .windows(2)
            .map(|w| (w[1] - w[0]).max(0.0))
            .sum::<f64>();

        let average_grade = match (elevations.first(), elevations.last()) {
            (Some(first), Some(last)) if distance_m > 0.0 => (last - first) / distance_m * 100.0,
            _ => 0.0,
        };

        let max_grade = geo::local_grades(points).into_iter().reduce(f64::max);

        Self {
            distance_m,
            elevation_gain_m,
            average_grade,
            max_grade,
        }
    }
}

/// Build a segment from a polyline.
pub fn segment_from_points(
    id: SegmentId,
    name: impl Into<String>,
    points: Vec<TrackPoint>,
) -> Result<Segment, ImportError> {
    if points.len() < 2 {
        return Err(ImportError::TooFewPoints(points.len()));
    }

    let summary = TrackSummary::from_points(&points);
    let mut segment = Segment::new(
        id,
        name,
        summary.distance_m,
        summary.elevation_gain_m,
        summary.average_grade,
    )
    .with_polyline(points);
    segment.max_grade = summary.max_grade;

    Ok(segment)
}

/// Import a segment from a GPX file.
///
/// When `name` is `None` the track name from the file is used.
pub fn import_gpx_file(path: &Path, id: SegmentId, name: Option<String>) -> Result<Segment, ImportError> {
    let content = std::fs::read(path).map_err(|e| ImportError::IoError(e.to_string()))?;

    let parsed = self::gpx::parse_gpx(&content)?;
    let name = name
        .or(parsed.name)
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("Segment {}", id))
        });

    let segment = segment_from_points(id, name, parsed.points)?;
    tracing::info!(
        segment_id = %segment.id,
        name = %segment.name,
        distance_m = segment.distance_m,
        elevation_gain_m = segment.elevation_gain_m,
        "Imported segment from GPX"
    );

    Ok(segment)
}
