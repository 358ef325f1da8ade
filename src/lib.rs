pub mod appearance;
pub mod bbox;
pub mod config;
pub mod error;
pub mod frame;
pub mod math;
pub mod matcher;
pub mod multistage;
pub mod object;
pub mod pruning;
pub mod region;
pub mod shapefeatures;
pub mod store;

#[cfg(feature = "opencv")]
pub mod cv;

mod track;

pub use bbox::BoundingBox;
pub use config::TrackerConfig;
pub use frame::Frame;
pub use multistage::{FrameReport, MultistageTracker};
pub use object::{ObjectId, ObjectState, TrackedObject};
pub use region::Region;
pub use track::Track;

use error::Error;
use std::rc::Rc;

pub trait Tracking {
    fn track(&mut self, frame: &Frame) -> Result<FrameReport, Error>;
    fn count(&self) -> usize;
    fn tracks(&self) -> Rc<[Track]>;
}
