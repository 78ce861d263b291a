//! Pulsar Index: segment difficulty scoring.
//!
//! The index combines climb steepness and height (`Base`), altitude
//! (`Oxygen`) and the irregularity of the gradient (`Pivot`):
//!
//! ```text
//! Base   = 20 * H^2 / L + 3 * H
//! Oxygen = 1 + Alt / 8000
//! Pivot  = 1 + sigma * (AvgP - 8) / 50
//! index  = round(Base * Oxygen * Pivot)
//! ```
//!
//! All guards are clamps; scoring never fails.

use serde::{Deserialize, Serialize};

use super::geo;
use super::Segment;

/// Floor applied to elevation gain (meters).
pub const MIN_ELEVATION_GAIN_M: f64 = 1.0;
/// Floor applied to segment length (meters).
pub const MIN_DISTANCE_M: f64 = 100.0;
/// Polylines need more than this many usable points for the variance walk.
pub const MIN_POLYLINE_POINTS: usize = 5;
/// Usable points needed before the polyline peak is trusted as altitude.
pub const MIN_ALTITUDE_POINTS: usize = 2;

/// Average grade above which the fallback sigma is [`SIGMA_FALLBACK_STEEP`].
const SIGMA_FALLBACK_GRADE: f64 = 3.0;
const SIGMA_FALLBACK_STEEP: f64 = 1.2;
const SIGMA_FALLBACK_GENTLE: f64 = 0.5;

const ALTITUDE_SCALE_M: f64 = 8000.0;
const PIVOT_GRADE: f64 = 8.0;
const PIVOT_SCALE: f64 = 50.0;

/// Computed difficulty of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyResult {
    /// Pulsar Index
    pub index: i64,
    /// Standard deviation of local grades (percent)
    pub sigma: f64,
    /// Elevation gain per kilometer
    pub density: f64,
}

/// Clamped inputs feeding the formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringInputs {
    pub elevation_gain_m: f64,
    pub distance_m: f64,
    pub average_grade: f64,
    pub peak_altitude_m: f64,
    pub sigma: f64,
}

impl ScoringInputs {
    /// Derive the clamped inputs from a segment.
    pub fn from_segment(segment: &Segment) -> Self {
        let h = clamp_min(segment.elevation_gain_m, MIN_ELEVATION_GAIN_M);
        let l = clamp_min(segment.distance_m, MIN_DISTANCE_M);
        let avg_p = clamp_min(segment.average_grade, 0.0);

        let usable = segment.polyline.iter().filter(|p| p.is_usable()).count();
        let peak = if usable >= MIN_ALTITUDE_POINTS {
            geo::peak_elevation(&segment.polyline)
        } else {
            None
        };
        let peak_altitude_m = match peak {
            Some(alt) if alt > 0.0 => alt,
            _ => h,
        };

        Self {
            elevation_gain_m: h,
            distance_m: l,
            average_grade: avg_p,
            peak_altitude_m,
            sigma: grade_sigma(segment, avg_p),
        }
    }

    pub fn density(&self) -> f64 {
        self.elevation_gain_m / (self.distance_m / 1000.0)
    }

    pub fn base(&self) -> f64 {
        let h = self.elevation_gain_m;
        20.0 * (h * h / self.distance_m) + 3.0 * h
    }

    pub fn oxygen(&self) -> f64 {
        1.0 + self.peak_altitude_m / ALTITUDE_SCALE_M
    }

    pub fn pivot(&self) -> f64 {
        1.0 + (self.sigma * (self.average_grade - PIVOT_GRADE)) / PIVOT_SCALE
    }

    pub fn raw_score(&self) -> f64 {
        self.base() * self.oxygen() * self.pivot()
    }
}

/// Score a segment.
pub fn score(segment: &Segment) -> DifficultyResult {
    let inputs = ScoringInputs::from_segment(segment);
    let raw = inputs.raw_score();
    let index = round_half_up(raw);

    tracing::debug!(
        segment_id = %segment.id,
        base = inputs.base(),
        oxygen = inputs.oxygen(),
        pivot = inputs.pivot(),
        raw,
        index,
        "Scored segment"
    );

    DifficultyResult {
        index,
        sigma: inputs.sigma,
        density: inputs.density(),
    }
}

/// Round to the nearest integer, halves toward positive infinity.
///
/// Overflowing scores saturate at the `i64` bounds; NaN maps to 0.
pub fn round_half_up(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    // `as` saturates, including for the infinities
    (value + 0.5).floor() as i64
}

/// Standard deviation of the 25 m local grades, or the fallback when the
/// polyline is too sparse to sample.
fn grade_sigma(segment: &Segment, average_grade: f64) -> f64 {
    let usable = segment.polyline.iter().filter(|p| p.is_usable()).count();

    if usable > MIN_POLYLINE_POINTS {
        let grades = geo::local_grades(&segment.polyline);
        if grades.len() >= 2 {
            if let Some(sd) = geo::population_std_dev(&grades) {
                return sd;
            }
        }
    }

    if average_grade > SIGMA_FALLBACK_GRADE {
        SIGMA_FALLBACK_STEEP
    } else {
        SIGMA_FALLBACK_GENTLE
    }
}

/// NaN becomes the floor as well.
fn clamp_min(value: f64, floor: f64) -> f64 {
    if value.is_nan() {
        floor
    } else {
        value.max(floor)
    }
}
