//! Filters removing spurious or redundant potential objects.
//!
//! Every rule looks at the current potential objects ("prunable") and at the
//! confirmed ones ("reference"). Only potential objects are ever removed.

use log::debug;
use serde_derive::Serialize;

use crate::bbox::BoundingBox;
use crate::config::PruningConfig;
use crate::object::{ObjectId, ObjectState, TrackedObject};
use crate::store::ObjectStore;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneRule {
    Inactive,
    Subsumed,
    HighOverlap,
    SuperObject,
}

/// Diagnostic record of one removed object.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Pruned {
    pub id: ObjectId,
    pub rule: PruneRule,
    pub bbox: BoundingBox,
    pub frames_tracked: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Pruner {
    config: PruningConfig,
}

impl Pruner {
    pub fn new(config: PruningConfig) -> Self {
        Self { config }
    }

    /// Applies inactive, subsumed, high-overlap and super-object pruning in
    /// that order, each rule seeing the survivors of the previous one.
    pub fn run(&self, store: &mut ObjectStore, frame_number: u64) -> Vec<Pruned> {
        let mut pruned = Vec::new();

        for rule in [
            PruneRule::Inactive,
            PruneRule::Subsumed,
            PruneRule::HighOverlap,
            PruneRule::SuperObject,
        ] {
            let ids = {
                let prunable: Vec<&TrackedObject> =
                    store.in_state(ObjectState::Potential).collect();
                let reference: Vec<&TrackedObject> = store.counted().collect();

                match rule {
                    PruneRule::Inactive => self.inactive(&prunable, frame_number),
                    PruneRule::Subsumed => self.subsumed(&prunable, &reference),
                    PruneRule::HighOverlap => self.high_overlap(&prunable, &reference),
                    PruneRule::SuperObject => self.super_objects(&prunable, &reference),
                }
            };

            if ids.is_empty() {
                continue;
            }

            for obj in store.discard(&ids) {
                debug!(
                    "pruned {} ({:?}) after {} frames",
                    obj.id(),
                    rule,
                    obj.frames_tracked
                );

                pruned.push(Pruned {
                    id: obj.id(),
                    rule,
                    bbox: obj.bbox,
                    frames_tracked: obj.frames_tracked,
                });
            }
        }

        pruned
    }

    /// Objects not updated within the inactive window.
    pub fn inactive(&self, prunable: &[&TrackedObject], frame_number: u64) -> Vec<ObjectId> {
        prunable
            .iter()
            .filter(|o| {
                frame_number.saturating_sub(o.last_frame_tracked) > self.config.inactive_window
            })
            .map(|o| o.id())
            .collect()
    }

    /// Objects whose box lies entirely inside another object's box.
    ///
    /// Of two potential objects with the same box only one goes: the one
    /// tracked for fewer frames, or the later one on a tie.
    pub fn subsumed(
        &self,
        prunable: &[&TrackedObject],
        reference: &[&TrackedObject],
    ) -> Vec<ObjectId> {
        prunable
            .iter()
            .filter(|obj| {
                reference.iter().any(|known| known.contains(obj))
                    || prunable.iter().any(|other| {
                        other.id() != obj.id()
                            && other.contains(obj)
                            && !(obj.contains(other) && outranks(obj, other))
                    })
            })
            .map(|o| o.id())
            .collect()
    }

    /// The smaller of two objects when it is mostly covered by a mature one.
    pub fn high_overlap(
        &self,
        prunable: &[&TrackedObject],
        reference: &[&TrackedObject],
    ) -> Vec<ObjectId> {
        let new_frames = self.config.new_object_frames;
        let ratio = self.config.overlap_ratio;

        prunable
            .iter()
            .filter(|obj| {
                let area = obj.bbox.area();

                others(obj, prunable, reference).any(|other| {
                    !other.is_new(new_frames)
                        && area <= other.bbox.area()
                        && obj.bbox_overlap_area(other) > ratio * area
                })
            })
            .map(|o| o.id())
            .collect()
    }

    /// Candidates restating a confirmed object: they cover most of its box.
    pub fn super_objects(
        &self,
        prunable: &[&TrackedObject],
        reference: &[&TrackedObject],
    ) -> Vec<ObjectId> {
        let ratio = self.config.overlap_ratio;

        prunable
            .iter()
            .filter(|obj| {
                reference
                    .iter()
                    .any(|known| obj.bbox_overlap_area(known) > ratio * known.bbox.area())
            })
            .map(|o| o.id())
            .collect()
    }
}

fn outranks(a: &TrackedObject, b: &TrackedObject) -> bool {
    (a.frames_tracked, std::cmp::Reverse(a.id())) > (b.frames_tracked, std::cmp::Reverse(b.id()))
}

fn others<'a>(
    obj: &'a TrackedObject,
    prunable: &'a [&'a TrackedObject],
    reference: &'a [&'a TrackedObject],
) -> impl Iterator<Item = &'a TrackedObject> + 'a {
    prunable
        .iter()
        .chain(reference.iter())
        .copied()
        .filter(move |other| other.id() != obj.id())
}
