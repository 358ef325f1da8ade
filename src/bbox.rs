use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates, stored as left-top corner and width-height
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    #[inline]
    pub fn new(x0: f32, y0: f32, width: f32, height: f32) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
        }
    }

    #[inline(always)]
    pub fn x1(&self) -> f32 {
        self.x0 + self.width
    }

    #[inline(always)]
    pub fn y1(&self) -> f32 {
        self.y0 + self.height
    }

    #[inline(always)]
    pub fn top_left(&self) -> na::Point2<f32> {
        na::Point2::new(self.x0, self.y0)
    }

    #[inline(always)]
    pub fn bottom_right(&self) -> na::Point2<f32> {
        na::Point2::new(self.x1(), self.y1())
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(self.x0 + self.width / 2.0, self.y0 + self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Degenerate boxes must be skipped by anything that samples pixels inside them.
    #[inline]
    pub fn has_negative_area(&self) -> bool {
        self.width < 0.0 || self.height < 0.0
    }

    pub fn contains_point(&self, p: na::Point2<f32>) -> bool {
        p.x >= self.x0 && p.x <= self.x1() && p.y >= self.y0 && p.y <= self.y1()
    }

    pub fn contains_bbox(&self, other: &BoundingBox) -> bool {
        self.contains_point(other.top_left()) && self.contains_point(other.bottom_right())
    }

    pub fn overlap_area(&self, other: &BoundingBox) -> f32 {
        let x_overlap = (self.x1().min(other.x1()) - self.x0.max(other.x0)).max(0.0);
        let y_overlap = (self.y1().min(other.y1()) - self.y0.max(other.y0)).max(0.0);

        x_overlap * y_overlap
    }

    #[inline]
    pub fn update(&mut self, other: &BoundingBox) {
        *self = *other;
    }

    /// Left-top-right-bottom corners
    #[inline]
    pub fn as_ltrb(&self) -> [f32; 4] {
        [self.x0, self.y0, self.x1(), self.y1()]
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.x0, bbox.y0, bbox.width, bbox.height]
    }
}
