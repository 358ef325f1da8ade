use serde_derive::Serialize;

use crate::bbox::BoundingBox;
use crate::object::{ObjectId, ObjectState, TrackedObject};

/// Read-only view of a tracked object handed to consumers.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Track {
    pub id: ObjectId,
    pub state: ObjectState,
    pub bbox: BoundingBox,
    pub area: f32,
    pub angle: f32,

    // (dx, dy) in px/frame
    pub velocity: (f32, f32),

    pub frames_tracked: u32,
    pub last_frame_tracked: u64,
}

impl From<&TrackedObject> for Track {
    fn from(o: &TrackedObject) -> Track {
        Track {
            id: o.id(),
            state: o.state(),
            bbox: o.bbox,
            area: o.area,
            angle: o.angle,
            velocity: (o.velocity.x, o.velocity.y),
            frames_tracked: o.frames_tracked,
            last_frame_tracked: o.last_frame_tracked,
        }
    }
}
