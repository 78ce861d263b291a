//! Segment definitions and difficulty scoring.
//!
//! A segment is an immutable stretch of road with a recorded path and
//! elevation profile. Scoring turns its geometry into the Pulsar Index and a
//! coarse climb category.

pub mod category;
pub mod difficulty;
pub mod geo;

use serde::{Deserialize, Serialize};

pub use category::{classify, score_all, score_segment, ClimbCategory, ScoredSegment, SurfaceTag};
pub use difficulty::{score, DifficultyResult};

/// Segment identifier (the provider's numeric segment id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub i64);

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One sample of a segment polyline.
///
/// Serialized as `[lat, lon, elevation]`; the elevation may be omitted or null.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPoint", into = "RawPoint")]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64, elevation: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }

    /// Elevation, if present and finite.
    pub fn finite_elevation(&self) -> Option<f64> {
        self.elevation.filter(|e| e.is_finite())
    }

    /// Whether the point can take part in geometric computations.
    pub fn is_usable(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite() && self.finite_elevation().is_some()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawPoint {
    WithElevation(f64, f64, Option<f64>),
    Flat(f64, f64),
}

impl From<RawPoint> for TrackPoint {
    fn from(raw: RawPoint) -> Self {
        match raw {
            RawPoint::WithElevation(lat, lon, ele) => TrackPoint::new(lat, lon, ele),
            RawPoint::Flat(lat, lon) => TrackPoint::new(lat, lon, None),
        }
    }
}

impl From<TrackPoint> for RawPoint {
    fn from(point: TrackPoint) -> Self {
        RawPoint::WithElevation(point.latitude, point.longitude, point.elevation)
    }
}

/// Manually assigned segment tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTag {
    pub label: String,
    pub color: String,
}

impl SegmentTag {
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
        }
    }
}

/// Segment definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub name: String,
    /// Free-text category from the provider (e.g. "climb", "gravel road")
    #[serde(default)]
    pub category: Option<String>,
    pub distance_m: f64,
    pub elevation_gain_m: f64,
    pub average_grade: f64,
    #[serde(default)]
    pub max_grade: Option<f64>,
    #[serde(default)]
    pub polyline: Vec<TrackPoint>,
    #[serde(default)]
    pub tags: Vec<SegmentTag>,
}

impl Segment {
    /// Create a segment without geometry.
    pub fn new(
        id: SegmentId,
        name: impl Into<String>,
        distance_m: f64,
        elevation_gain_m: f64,
        average_grade: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: None,
            distance_m,
            elevation_gain_m,
            average_grade,
            max_grade: None,
            polyline: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_polyline(mut self, polyline: Vec<TrackPoint>) -> Self {
        self.polyline = polyline;
        self
    }

    pub fn with_tag(mut self, tag: SegmentTag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Segment length in kilometers.
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }
}
