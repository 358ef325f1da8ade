use nalgebra as na;

use crate::config::{AreaTolerance, MatcherConfig};
use crate::math;
use crate::object::{ObjectId, Shape, TrackedObject};

/// Decides whether two shape snapshots describe the same physical object.
///
/// Centroid distance, area and orientation must all be within tolerance.
#[derive(Debug, Clone, Default)]
pub struct ShapeMatcher {
    config: MatcherConfig,
}

impl ShapeMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    #[inline]
    fn is_centroid_match(&self, a: &Shape, b: &Shape) -> bool {
        na::distance(&a.center, &b.center) < self.config.centroid_threshold
    }

    #[inline]
    fn is_area_match(&self, a: &Shape, b: &Shape) -> bool {
        match self.config.area {
            AreaTolerance::Absolute { pixels } => (a.area - b.area).abs() < pixels,
            AreaTolerance::Relative { ratio } => math::relative_difference(a.area, b.area) < ratio,
        }
    }

    #[inline]
    fn is_angle_match(&self, a: &Shape, b: &Shape) -> bool {
        (a.angle - b.angle).abs() < self.config.angle_threshold
    }

    pub fn is_match(&self, a: &Shape, b: &Shape) -> bool {
        self.is_centroid_match(a, b) && self.is_area_match(a, b) && self.is_angle_match(a, b)
    }

    pub fn find_matches<'a, I>(&self, target: &Shape, candidates: I) -> Vec<ObjectId>
    where
        I: IntoIterator<Item = &'a TrackedObject>,
    {
        candidates
            .into_iter()
            .filter(|c| self.is_match(target, &c.shape()))
            .map(|c| c.id())
            .collect()
    }

    pub fn has_match<'a, I>(&self, target: &Shape, candidates: I) -> bool
    where
        I: IntoIterator<Item = &'a TrackedObject>,
    {
        candidates
            .into_iter()
            .any(|c| self.is_match(target, &c.shape()))
    }
}
