use serde_derive::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::math;

/// One foreground blob as reported by connected-component extraction.
///
/// Contains the axis-aligned bounding rect (left-top and width-height), the
/// contour area and the raw angle of the minimum-area rotated rectangle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(rename = "a")]
    pub area: f32,
    #[serde(rename = "r", default)]
    pub angle: f32,
}

impl Region {
    pub fn new(x: f32, y: f32, w: f32, h: f32, area: f32, angle: f32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            area,
            angle,
        }
    }

    #[inline(always)]
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.w, self.h)
    }

    /// Orientation folded into (-45, 45] degrees
    #[inline]
    pub fn orientation(&self) -> f32 {
        math::fold_angle(self.angle)
    }
}
