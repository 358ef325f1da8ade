use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

use crate::bbox::BoundingBox;
use crate::region::Region;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which tracking stage currently owns the object.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectState {
    /// Freshly detected, not yet trusted and not counted.
    Potential,
    /// Confirmed; position driven by contour matching.
    Moving,
    /// Confirmed; position driven by appearance tracking.
    Stationary,
}

impl ObjectState {
    #[inline]
    pub fn is_counted(self) -> bool {
        !matches!(self, ObjectState::Potential)
    }
}

/// Shape features compared by the matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub center: na::Point2<f32>,
    pub area: f32,
    pub angle: f32,
}

impl From<&Region> for Shape {
    fn from(region: &Region) -> Self {
        Shape {
            center: region.bbox().center(),
            area: region.area,
            angle: region.orientation(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackedObject {
    pub(crate) id: ObjectId,
    pub(crate) state: ObjectState,
    pub bbox: BoundingBox,
    pub area: f32,
    pub previous_area: f32,
    pub angle: f32,
    // center displacement since the previous update, px/frame
    pub velocity: na::Vector2<f32>,
    pub frames_tracked: u32,
    pub last_frame_tracked: u64,
}

impl TrackedObject {
    pub(crate) fn new(id: ObjectId, region: &Region, frame_number: u64) -> Self {
        Self {
            id,
            state: ObjectState::Potential,
            bbox: region.bbox(),
            area: region.area,
            previous_area: 0.0,
            angle: region.orientation(),
            velocity: na::Vector2::zeros(),
            frames_tracked: 1,
            last_frame_tracked: frame_number,
        }
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> ObjectState {
        self.state
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        self.bbox.center()
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        Shape {
            center: self.center(),
            area: self.area,
            angle: self.angle,
        }
    }

    /// Applies a contour observation for `frame_number`.
    pub fn observe(&mut self, region: &Region, frame_number: u64) {
        let bbox = region.bbox();

        self.velocity = bbox.center() - self.center();
        self.bbox.update(&bbox);
        self.previous_area = self.area;
        self.area = region.area;
        self.angle = region.orientation();

        self.mark_tracked(frame_number);
    }

    /// Moves the box without a new contour, as the appearance stage does.
    ///
    /// Returns the displacement of the center.
    pub fn relocate(&mut self, bbox: BoundingBox, frame_number: u64) -> na::Vector2<f32> {
        let shift = bbox.center() - self.center();

        self.velocity = shift;
        self.bbox.update(&bbox);
        self.mark_tracked(frame_number);

        shift
    }

    fn mark_tracked(&mut self, frame_number: u64) {
        self.frames_tracked = self.frames_tracked.saturating_add(1);
        self.last_frame_tracked = self.last_frame_tracked.max(frame_number);
    }

    #[inline]
    pub fn delta_area(&self) -> f32 {
        self.area - self.previous_area
    }

    #[inline]
    pub fn is_new(&self, new_object_frames: u32) -> bool {
        self.frames_tracked < new_object_frames
    }

    /// Slow on both axes and shrinking.
    pub fn is_not_moving(&self, speed: f32) -> bool {
        self.velocity.x.abs() < speed && self.velocity.y.abs() < speed && self.delta_area() < 0.0
    }

    #[inline]
    pub fn contains(&self, other: &TrackedObject) -> bool {
        self.bbox.contains_bbox(&other.bbox)
    }

    #[inline]
    pub fn bbox_overlap_area(&self, other: &TrackedObject) -> f32 {
        self.bbox.overlap_area(&other.bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: f32, y: f32, area: f32) -> Region {
        Region::new(x, y, 20.0, 10.0, area, 0.0)
    }

    #[test]
    fn created_as_potential() {
        let obj = TrackedObject::new(ObjectId(1), &region(10.0, 10.0, 150.0), 7);

        assert_eq!(obj.state(), ObjectState::Potential);
        assert_eq!(obj.frames_tracked, 1);
        assert_eq!(obj.last_frame_tracked, 7);
        assert_eq!(obj.velocity, na::Vector2::zeros());
    }

    #[test]
    fn observe_updates_velocity_and_area_history() {
        let mut obj = TrackedObject::new(ObjectId(1), &region(10.0, 10.0, 150.0), 1);
        obj.observe(&region(13.0, 8.0, 140.0), 2);

        assert_eq!(obj.velocity, na::Vector2::new(3.0, -2.0));
        assert_eq!(obj.previous_area, 150.0);
        assert_eq!(obj.area, 140.0);
        assert_eq!(obj.delta_area(), -10.0);
        assert_eq!(obj.frames_tracked, 2);
        assert_eq!(obj.last_frame_tracked, 2);
    }

    #[test]
    fn not_moving_needs_slow_and_shrinking() {
        let mut obj = TrackedObject::new(ObjectId(1), &region(10.0, 10.0, 150.0), 1);

        obj.observe(&region(11.0, 10.0, 140.0), 2);
        assert!(obj.is_not_moving(2.0));

        obj.observe(&region(12.0, 11.0, 145.0), 3);
        assert!(!obj.is_not_moving(2.0));

        obj.observe(&region(16.0, 11.0, 120.0), 4);
        assert!(!obj.is_not_moving(2.0));
    }

    #[test]
    fn relocate_counts_as_observation() {
        let mut obj = TrackedObject::new(ObjectId(1), &region(10.0, 10.0, 150.0), 1);
        let shift = obj.relocate(BoundingBox::new(20.0, 10.0, 20.0, 10.0), 5);

        assert_eq!(shift, na::Vector2::new(10.0, 0.0));
        assert_eq!(obj.area, 150.0);
        assert_eq!(obj.frames_tracked, 2);
        assert_eq!(obj.last_frame_tracked, 5);
    }

    #[test]
    fn frames_tracked_never_decreases() {
        let mut obj = TrackedObject::new(ObjectId(1), &region(10.0, 10.0, 150.0), 1);
        let mut last = obj.frames_tracked;

        for frame in 2..30 {
            obj.observe(&region(10.0 + frame as f32, 10.0, 150.0), frame);
            assert!(obj.frames_tracked > last);
            last = obj.frames_tracked;
        }
    }
}
