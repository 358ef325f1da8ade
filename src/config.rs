use serde_derive::{Deserialize, Serialize};

use crate::error::Error;

/// How similar two region areas must be to be considered the same object.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AreaTolerance {
    /// `|a - b| < pixels`
    Absolute { pixels: f32 },
    /// `|a - b| / max(a, b) < ratio`
    Relative { ratio: f32 },
}

impl Default for AreaTolerance {
    fn default() -> Self {
        AreaTolerance::Relative { ratio: 0.4 }
    }
}

/// What stage 1 does with a region that matches several tracked objects.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MultiMatchPolicy {
    /// Update only the object with the nearest centroid, lowest id on ties.
    #[default]
    Closest,
    /// Update every matching object with the same observation.
    All,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MatcherConfig {
    pub centroid_threshold: f32,
    pub area: AreaTolerance,
    /// In degrees
    pub angle_threshold: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            centroid_threshold: 40.0,
            area: AreaTolerance::default(),
            angle_threshold: 30.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PruningConfig {
    /// Frames a potential object may go without an update before it is dropped.
    pub inactive_window: u64,
    /// Objects tracked for fewer frames are "new" and never suppress others.
    pub new_object_frames: u32,
    pub overlap_ratio: f32,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            inactive_window: 0,
            new_object_frames: 5,
            overlap_ratio: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ShapeConfig {
    pub maturity_frames: u32,
    /// Fraction of the frame size excluded on every side for new objects.
    pub border_margin: f32,
    /// Speed (px/frame, per axis) below which a shrinking object counts as stopped.
    pub stationary_speed: f32,
    pub multi_match: MultiMatchPolicy,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            maturity_frames: 15,
            border_margin: 0.2,
            stationary_speed: 2.0,
            multi_match: MultiMatchPolicy::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppearanceConfig {
    pub hue_bins: usize,
    /// Half-open `[min, max)` range of 8-bit hue values covered by the histogram.
    pub hue_range: (u8, u8),
    pub max_iterations: usize,
    pub epsilon: f32,
    /// Displacement (px) after which a stationary object is moving again.
    pub motion_threshold: f32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            hue_bins: 16,
            hue_range: (0, 180),
            max_iterations: 10,
            epsilon: 1.0,
            motion_threshold: 5.0,
        }
    }
}

impl AppearanceConfig {
    /// Histogram range for a detector that segments hues `min..=max`.
    pub fn with_detector_hues(self, min: u8, max: u8) -> Self {
        Self {
            hue_range: (min, max.saturating_add(1).min(180)),
            ..self
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct TrackerConfig {
    pub matcher: MatcherConfig,
    pub pruning: PruningConfig,
    pub shape: ShapeConfig,
    pub appearance: AppearanceConfig,
}

impl TrackerConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, Error> {
        let config: TrackerConfig = toml::from_str(src)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if !(self.matcher.centroid_threshold > 0.0) {
            return invalid("matcher.centroid_threshold must be positive");
        }

        match self.matcher.area {
            AreaTolerance::Absolute { pixels } if !(pixels > 0.0) => {
                return invalid("matcher.area.pixels must be positive");
            }
            AreaTolerance::Relative { ratio } if !(ratio > 0.0 && ratio <= 1.0) => {
                return invalid("matcher.area.ratio must be in (0, 1]");
            }
            _ => {}
        }

        if !(self.matcher.angle_threshold > 0.0) {
            return invalid("matcher.angle_threshold must be positive");
        }

        if !(self.pruning.overlap_ratio > 0.0 && self.pruning.overlap_ratio <= 1.0) {
            return invalid("pruning.overlap_ratio must be in (0, 1]");
        }

        if self.shape.maturity_frames == 0 {
            return invalid("shape.maturity_frames must be at least 1");
        }

        if !(self.shape.border_margin >= 0.0 && self.shape.border_margin < 0.5) {
            return invalid("shape.border_margin must be in [0, 0.5)");
        }

        if !(self.shape.stationary_speed >= 0.0) {
            return invalid("shape.stationary_speed must not be negative");
        }

        let (hue_min, hue_max) = self.appearance.hue_range;
        if hue_min >= hue_max {
            return invalid("appearance.hue_range must be a non-empty range");
        }

        if self.appearance.hue_bins == 0 {
            return invalid("appearance.hue_bins must be at least 1");
        }

        if self.appearance.max_iterations == 0 {
            return invalid("appearance.max_iterations must be at least 1");
        }

        if !(self.appearance.epsilon >= 0.0) {
            return invalid("appearance.epsilon must not be negative");
        }

        if !(self.appearance.motion_threshold >= 0.0) {
            return invalid("appearance.motion_threshold must not be negative");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TrackerConfig::from_toml_str(
            r#"
            [matcher]
            centroid_threshold = 50.0
            area = { kind = "absolute", pixels = 1750.0 }

            [shape]
            multi_match = "all"
            "#,
        )
        .unwrap();

        assert_eq!(config.matcher.centroid_threshold, 50.0);
        assert_eq!(config.matcher.area, AreaTolerance::Absolute { pixels: 1750.0 });
        assert_eq!(config.matcher.angle_threshold, 30.0);
        assert_eq!(config.shape.multi_match, MultiMatchPolicy::All);
        assert_eq!(config.shape.maturity_frames, 15);
        assert_eq!(config.appearance, AppearanceConfig::default());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = TrackerConfig::default();
        config.shape.border_margin = 0.5;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = TrackerConfig::default();
        config.appearance.hue_range = (100, 75);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = TrackerConfig::default();
        config.matcher.area = AreaTolerance::Relative { ratio: 1.5 };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn histogram_follows_detector_hues() {
        let appearance = AppearanceConfig::default().with_detector_hues(75, 100);
        assert_eq!(appearance.hue_range, (75, 101));
        assert_eq!(appearance.hue_bins, 16);

        let appearance = AppearanceConfig::default().with_detector_hues(160, 179);
        assert_eq!(appearance.hue_range, (160, 180));

        let mut config = TrackerConfig::default();
        config.appearance = config.appearance.with_detector_hues(100, 75);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn reports_toml_syntax_errors() {
        assert!(matches!(
            TrackerConfig::from_toml_str("[matcher"),
            Err(Error::Toml(_))
        ));
    }
}
