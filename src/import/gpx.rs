//! GPX parser for segment import.

use super::ImportError;
use crate::segments::TrackPoint;

fn to_track_point(waypoint: &gpx::Waypoint) -> TrackPoint {
    let point = waypoint.point();
    TrackPoint::new(point.y(), point.x(), waypoint.elevation)
}

/// Points and name read from one GPX document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedGpx {
    pub name: Option<String>,
    pub points: Vec<TrackPoint>,
}

/// Parse GPX file content to track points and the track name.
///
/// Track points are preferred, then route points, then bare waypoints.
pub fn parse_gpx(content: &[u8]) -> Result<ParsedGpx, ImportError> {
    let gpx_data: gpx::Gpx =
        gpx::read(content).map_err(|e| ImportError::ParseError(format!("GPX parse error: {}", e)))?;

    let mut points: Vec<TrackPoint> = gpx_data
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .map(to_track_point)
        .collect();

    if points.is_empty() {
        points = gpx_data
            .routes
            .iter()
            .flat_map(|route| route.points.iter())
            .map(to_track_point)
            .collect();
    }

    if points.is_empty() {
        points = gpx_data.waypoints.iter().map(to_track_point).collect();
    }

    if points.is_empty() {
        return Err(ImportError::ParseError(
            "No GPS points found in GPX file".to_string(),
        ));
    }

    tracing::debug!(points = points.len(), "Parsed GPX");
    Ok(ParsedGpx {
        name: document_name(&gpx_data),
        points,
    })
}

/// Track name, then route name, then metadata name.
fn document_name(gpx_data: &gpx::Gpx) -> Option<String> {
    gpx_data
        .tracks
        .first()
        .and_then(|t| t.name.clone())
        .or_else(|| gpx_data.routes.first().and_then(|r| r.name.clone()))
        .or_else(|| gpx_data.metadata.as_ref().and_then(|m| m.name.clone()))
}
