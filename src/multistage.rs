use std::rc::Rc;

use log::info;

use crate::appearance::{AppearanceTracker, AppearanceUpdate};
use crate::config::TrackerConfig;
use crate::error::Error;
use crate::object::{ObjectState, TrackedObject};
use crate::shapefeatures::{ShapeFeatureTracker, ShapeUpdate};
use crate::store::ObjectStore;
use crate::{Frame, Track};

/// Everything that happened to the tracked objects during one frame.
#[derive(Debug, Default, Clone)]
pub struct FrameReport {
    pub frame_number: u64,
    pub shape: ShapeUpdate,
    pub appearance: AppearanceUpdate,
    pub count: usize,
}

/// Two-stage tracker: shape features find and confirm objects, appearance
/// tracking keeps stationary ones located.
///
/// An object is counted from the moment it is confirmed and stays counted
/// for the rest of the session.
#[derive(Debug)]
pub struct MultistageTracker {
    shape: ShapeFeatureTracker,
    appearance: AppearanceTracker,
    store: ObjectStore,
    frame_number: u64,
}

impl Default for MultistageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MultistageTracker {
    pub fn new() -> Self {
        Self::build(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self::build(config))
    }

    fn build(config: TrackerConfig) -> Self {
        Self {
            shape: ShapeFeatureTracker::new(&config),
            appearance: AppearanceTracker::new(config.appearance),
            store: ObjectStore::new(),
            frame_number: 0,
        }
    }

    /// Number of the last processed frame; the first frame is 1.
    #[inline]
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.store.count()
    }

    #[inline]
    pub fn potential_objects(&self) -> impl Iterator<Item = &TrackedObject> {
        self.store.in_state(ObjectState::Potential)
    }

    #[inline]
    pub fn moving_objects(&self) -> impl Iterator<Item = &TrackedObject> {
        self.store.in_state(ObjectState::Moving)
    }

    #[inline]
    pub fn stationary_objects(&self) -> impl Iterator<Item = &TrackedObject> {
        self.store.in_state(ObjectState::Stationary)
    }

    #[inline]
    pub fn objects(&self) -> impl Iterator<Item = &TrackedObject> {
        self.store.iter()
    }

    pub fn track(&mut self, frame: &Frame) -> Result<FrameReport, Error> {
        frame.validate()?;

        self.frame_number += 1;
        let counted_before = self.store.count();

        let shape = self
            .shape
            .update(&mut self.store, self.frame_number, frame.dims, &frame.regions);

        let appearance = self
            .appearance
            .update(&mut self.store, self.frame_number, frame);

        let count = self.store.count();
        if count != counted_before {
            info!("frame {}: fish count {}", self.frame_number, count);
        }

        Ok(FrameReport {
            frame_number: self.frame_number,
            shape,
            appearance,
            count,
        })
    }
}

impl crate::Tracking for MultistageTracker {
    #[inline]
    fn track(&mut self, frame: &Frame) -> Result<FrameReport, Error> {
        MultistageTracker::track(self, frame)
    }

    #[inline]
    fn count(&self) -> usize {
        MultistageTracker::count(self)
    }

    fn tracks(&self) -> Rc<[Track]> {
        self.store
            .iter()
            .map(Track::from)
            .collect::<Vec<_>>()
            .into_boxed_slice()
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;
    use crate::Tracking;

    #[test]
    fn frame_counter_starts_at_one() {
        let mut tracker = MultistageTracker::new();
        assert_eq!(tracker.frame_number(), 0);

        let report = tracker.track(&Frame::blank((320, 240), Vec::new())).unwrap();

        assert_eq!(report.frame_number, 1);
        assert_eq!(tracker.frame_number(), 1);
        assert_eq!(report.count, 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = TrackerConfig::default();
        config.appearance.hue_bins = 0;

        assert!(MultistageTracker::with_config(config).is_err());
    }

    #[test]
    fn malformed_frame_does_not_advance() {
        let mut tracker = MultistageTracker::new();
        let frame = Frame {
            dims: (4, 4),
            hue: ndarray::Array2::zeros((4, 4)),
            mask: ndarray::Array2::from_elem((3, 4), false),
            regions: Vec::new(),
        };

        assert!(tracker.track(&frame).is_err());
        assert_eq!(tracker.frame_number(), 0);
    }

    #[test]
    fn frame_dims_must_match_planes() {
        let mut tracker = MultistageTracker::new();
        let mut frame = Frame::blank((8, 6), Vec::new());
        frame.dims = (6, 8);

        assert!(matches!(tracker.track(&frame), Err(Error::FrameShape { .. })));
    }

    #[test]
    fn tracks_snapshot_every_object() {
        let mut tracker = MultistageTracker::new();
        let region = Region::new(150.0, 110.0, 30.0, 12.0, 300.0, -85.0);
        let frame = Frame::blank((320, 240), vec![region]);
        tracker.track(&frame).unwrap();

        let tracks = tracker.tracks();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].state, ObjectState::Potential);
        assert_eq!(tracks[0].angle, 5.0);
        assert_eq!(Tracking::count(&tracker), 0);
    }
}
