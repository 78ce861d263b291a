//! Climb categories and surface tags derived from the Pulsar Index.

use serde::{Deserialize, Serialize};

use super::difficulty::{score, DifficultyResult};
use super::{Segment, SegmentId, SegmentTag};

/// Segments at least this long with a low density are mythic loops.
const MYTHIC_LOOP_MIN_DISTANCE_M: f64 = 50_000.0;
const MYTHIC_LOOP_MAX_DENSITY: f64 = 30.0;

/// Climb category, hardest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimbCategory {
    /// Long, low-density loop
    MythicLoop,
    Iconic,
    /// Hors categorie
    HorsCategorie,
    Cat1,
    Cat2,
    Cat3,
    Cat4,
    /// Regional hill
    RegionalClimb,
    Flat,
}

impl ClimbCategory {
    /// Lower index bounds (exclusive) of the index tiers, hardest first.
    const INDEX_TIERS: [(i64, ClimbCategory); 7] = [
        (7500, ClimbCategory::Iconic),
        (6500, ClimbCategory::HorsCategorie),
        (5000, ClimbCategory::Cat1),
        (3000, ClimbCategory::Cat2),
        (1500, ClimbCategory::Cat3),
        (1000, ClimbCategory::Cat4),
        (500, ClimbCategory::RegionalClimb),
    ];

    /// Category for an index alone, ignoring the mythic-loop rule.
    pub fn from_index(index: i64) -> Self {
        Self::INDEX_TIERS
            .iter()
            .find(|(floor, _)| index > *floor)
            .map(|(_, category)| *category)
            .unwrap_or(ClimbCategory::Flat)
    }

    /// Category for a scored segment.
    pub fn categorize(index: i64, distance_m: f64, density: f64) -> Self {
        if distance_m >= MYTHIC_LOOP_MIN_DISTANCE_M && density < MYTHIC_LOOP_MAX_DENSITY {
            return ClimbCategory::MythicLoop;
        }
        Self::from_index(index)
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            ClimbCategory::MythicLoop => "BOUCLE MYTHIQUE",
            ClimbCategory::Iconic => "ICONIC",
            ClimbCategory::HorsCategorie => "HC",
            ClimbCategory::Cat1 => "CAT 1",
            ClimbCategory::Cat2 => "CAT 2",
            ClimbCategory::Cat3 => "CAT 3",
            ClimbCategory::Cat4 => "CAT 4",
            ClimbCategory::RegionalClimb => "COTE REGION",
            ClimbCategory::Flat => "PLAT",
        }
    }
}

impl std::fmt::Display for ClimbCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Road surface detected from the segment's free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceTag {
    Cobblestone,
    Gravel,
}

impl SurfaceTag {
    pub fn label(&self) -> &'static str {
        match self {
            SurfaceTag::Cobblestone => "PAVÉS",
            SurfaceTag::Gravel => "GRAVEL",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SurfaceTag::Cobblestone => "#a16207",
            SurfaceTag::Gravel => "#78716c",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            SurfaceTag::Cobblestone => &["pavé", "cobble"],
            SurfaceTag::Gravel => &["gravel", "chemin"],
        }
    }

    /// Surface tags matching the segment's name or category, case-insensitively.
    pub fn detect(name: &str, category: Option<&str>) -> Vec<SurfaceTag> {
        let haystacks = [
            Some(name.to_lowercase()),
            category.map(str::to_lowercase),
        ];

        [SurfaceTag::Cobblestone, SurfaceTag::Gravel]
            .into_iter()
            .filter(|tag| {
                haystacks.iter().flatten().any(|text| {
                    tag.keywords().iter().any(|keyword| text.contains(keyword))
                })
            })
            .collect()
    }

    pub fn to_tag(self) -> SegmentTag {
        SegmentTag::new(self.label(), self.color())
    }
}

/// Category and tags for a segment with a known difficulty.
pub fn classify(segment: &Segment, difficulty: &DifficultyResult) -> (ClimbCategory, Vec<SurfaceTag>) {
    let category = ClimbCategory::categorize(difficulty.index, segment.distance_m, difficulty.density);
    let surfaces = SurfaceTag::detect(&segment.name, segment.category.as_deref());
    (category, surfaces)
}

/// Full scorer output for a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSegment {
    pub segment_id: SegmentId,
    pub index: i64,
    pub sigma: f64,
    pub density: f64,
    pub category: ClimbCategory,
    pub category_label: String,
    /// Surface labels followed by the manual tag labels
    pub surface_tags: Vec<String>,
    /// Colored badges: surface tags, then manual tags as assigned
    pub tags: Vec<SegmentTag>,
}

/// Score and classify a segment.
pub fn score_segment(segment: &Segment) -> ScoredSegment {
    let difficulty = score(segment);
    let (category, surfaces) = classify(segment, &difficulty);

    let tags: Vec<SegmentTag> = surfaces
        .iter()
        .map(|s| s.to_tag())
        .chain(segment.tags.iter().cloned())
        .collect();

    ScoredSegment {
        segment_id: segment.id,
        index: difficulty.index,
        sigma: difficulty.sigma,
        density: difficulty.density,
        category,
        category_label: category.label().to_string(),
        surface_tags: tags.iter().map(|t| t.label.clone()).collect(),
        tags,
    }
}

/// Score a batch of segments, preserving input order.
#[cfg(feature = "parallel")]
pub fn score_all(segments: &[Segment]) -> Vec<ScoredSegment> {
    use rayon::prelude::*;

    tracing::debug!(count = segments.len(), "Scoring segments in parallel");
    segments.par_iter().map(score_segment).collect()
}

/// Score a batch of segments, preserving input order.
#[cfg(not(feature = "parallel"))]
pub fn score_all(segments: &[Segment]) -> Vec<ScoredSegment> {
    tracing::debug!(count = segments.len(), "Scoring segments");
    segments.iter().map(score_segment).collect()
}
