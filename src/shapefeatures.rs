use log::{debug, info, trace};
use nalgebra as na;

use crate::config::{MultiMatchPolicy, ShapeConfig, TrackerConfig};
use crate::math;
use crate::matcher::ShapeMatcher;
use crate::object::{ObjectId, ObjectState, Shape};
use crate::pruning::{Pruned, Pruner};
use crate::region::Region;
use crate::store::ObjectStore;

/// What stage 1 did during one frame.
#[derive(Debug, Default, Clone)]
pub struct ShapeUpdate {
    pub created: Vec<ObjectId>,
    pub updated: Vec<ObjectId>,
    /// Regions ignored because a stationary object already explains them.
    pub skipped: usize,
    pub pruned: Vec<Pruned>,
    pub confirmed: Vec<ObjectId>,
    pub stopped: Vec<ObjectId>,
}

/// Contour-driven tracking of potential and moving objects.
///
/// Regions are matched on centroid, area and orientation. Unmatched regions
/// away from the frame border become potential objects; those that keep
/// matching for `maturity_frames` are confirmed, and confirmed objects that
/// settle are handed to the appearance stage.
#[derive(Debug, Clone)]
pub struct ShapeFeatureTracker {
    matcher: ShapeMatcher,
    pruner: Pruner,
    config: ShapeConfig,
}

impl Default for ShapeFeatureTracker {
    fn default() -> Self {
        Self::new(&TrackerConfig::default())
    }
}

impl ShapeFeatureTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            matcher: ShapeMatcher::new(config.matcher.clone()),
            pruner: Pruner::new(config.pruning.clone()),
            config: config.shape.clone(),
        }
    }

    pub fn update(
        &self,
        store: &mut ObjectStore,
        frame_number: u64,
        dims: (u32, u32),
        regions: &[Region],
    ) -> ShapeUpdate {
        let mut out = ShapeUpdate::default();
        let bounds = math::inset_bounds(dims, self.config.border_margin);

        for region in regions {
            let shape = Shape::from(region);

            if self
                .matcher
                .has_match(&shape, store.in_state(ObjectState::Stationary))
            {
                trace!("region at {:?} explained by a stationary object", shape.center);
                out.skipped += 1;
                continue;
            }

            let matches = self.matcher.find_matches(
                &shape,
                store.iter().filter(|o| o.state() != ObjectState::Stationary),
            );

            if matches.is_empty() {
                if math::in_bounds(shape.center, &bounds) {
                    out.created.push(store.create(region, frame_number));
                }
                continue;
            }

            for id in self.select(store, &shape, matches) {
                if let Some(obj) = store.get_mut(id) {
                    obj.observe(region, frame_number);
                    out.updated.push(id);
                }
            }
        }

        out.pruned = self.pruner.run(store, frame_number);

        let mature: Vec<ObjectId> = store
            .in_state(ObjectState::Potential)
            .filter(|o| o.frames_tracked >= self.config.maturity_frames)
            .map(|o| o.id())
            .collect();

        for id in mature {
            if store.transition(id, ObjectState::Potential, ObjectState::Moving) {
                info!("object {} confirmed, count {}", id, store.count());
                out.confirmed.push(id);
            }
        }

        let settled: Vec<ObjectId> = store
            .in_state(ObjectState::Moving)
            .filter(|o| o.is_not_moving(self.config.stationary_speed))
            .map(|o| o.id())
            .collect();

        for id in settled {
            if store.transition(id, ObjectState::Moving, ObjectState::Stationary) {
                debug!("object {} stopped", id);
                out.stopped.push(id);
            }
        }

        out
    }

    /// Applies the multi-match policy to the matched objects.
    fn select(&self, store: &ObjectStore, shape: &Shape, matches: Vec<ObjectId>) -> Vec<ObjectId> {
        if matches.len() < 2 || self.config.multi_match == MultiMatchPolicy::All {
            return matches;
        }

        debug!("region at {:?} matches {} objects", shape.center, matches.len());

        matches
            .iter()
            .filter_map(|&id| {
                let obj = store.get(id)?;
                Some((na::distance(&obj.center(), &shape.center), id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| vec![id])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pruning::PruneRule;

    const DIMS: (u32, u32) = (640, 480);

    fn fish(x: f32, y: f32, area: f32) -> Region {
        Region::new(x, y, 40.0, 20.0, area, 0.0)
    }

    fn tracker() -> ShapeFeatureTracker {
        ShapeFeatureTracker::default()
    }

    #[test]
    fn unmatched_region_near_center_creates_potential() {
        let mut store = ObjectStore::new();
        // center at (340, 250), 20 px right of the frame center
        let out = tracker().update(&mut store, 1, DIMS, &[fish(320.0, 240.0, 600.0)]);

        assert_eq!(out.created.len(), 1);
        let obj = store.get(out.created[0]).unwrap();
        assert_eq!(obj.state(), ObjectState::Potential);
        assert_eq!(obj.frames_tracked, 1);
    }

    #[test]
    fn region_at_border_is_not_trusted() {
        let mut store = ObjectStore::new();
        let out = tracker().update(&mut store, 1, DIMS, &[fish(5.0, 240.0, 600.0)]);

        assert!(out.created.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn potential_is_confirmed_after_maturity() {
        let t = tracker();
        let mut store = ObjectStore::new();
        t.update(&mut store, 1, DIMS, &[fish(200.0, 200.0, 600.0)]);

        for frame in 2..=14 {
            let x = 200.0 + 3.0 * frame as f32;
            let out = t.update(&mut store, frame, DIMS, &[fish(x, 200.0, 600.0)]);
            assert!(out.confirmed.is_empty());
        }

        let out = t.update(&mut store, 15, DIMS, &[fish(245.0, 200.0, 600.0)]);

        assert_eq!(out.confirmed, vec![ObjectId(1)]);
        assert_eq!(store.in_state(ObjectState::Potential).count(), 0);
        assert_eq!(store.in_state(ObjectState::Moving).count(), 1);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn missed_frame_prunes_potential() {
        let t = tracker();
        let mut store = ObjectStore::new();
        t.update(&mut store, 1, DIMS, &[fish(200.0, 200.0, 600.0)]);
        let out = t.update(&mut store, 2, DIMS, &[]);

        assert_eq!(out.pruned.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn settling_moving_object_becomes_stationary() {
        let t = tracker();
        let mut store = ObjectStore::new();
        let id = store.create(&fish(200.0, 200.0, 600.0), 1);
        store.transition(id, ObjectState::Potential, ObjectState::Moving);

        let out = t.update(&mut store, 2, DIMS, &[fish(201.0, 201.0, 580.0)]);

        assert_eq!(out.stopped, vec![id]);
        assert_eq!(store.get(id).unwrap().state(), ObjectState::Stationary);
    }

    #[test]
    fn slow_but_growing_object_keeps_moving() {
        let t = tracker();
        let mut store = ObjectStore::new();
        let id = store.create(&fish(200.0, 200.0, 600.0), 1);
        store.transition(id, ObjectState::Potential, ObjectState::Moving);

        let out = t.update(&mut store, 2, DIMS, &[fish(201.0, 201.0, 620.0)]);

        assert!(out.stopped.is_empty());
        assert_eq!(store.get(id).unwrap().state(), ObjectState::Moving);
    }

    #[test]
    fn region_matching_stationary_is_skipped() {
        let t = tracker();
        let mut store = ObjectStore::new();
        let id = store.create(&fish(200.0, 200.0, 600.0), 1);
        store.transition(id, ObjectState::Potential, ObjectState::Moving);
        store.transition(id, ObjectState::Moving, ObjectState::Stationary);

        let out = t.update(&mut store, 2, DIMS, &[fish(205.0, 200.0, 610.0)]);

        assert_eq!(out.skipped, 1);
        assert!(out.created.is_empty() && out.updated.is_empty());
        assert_eq!(store.get(id).unwrap().frames_tracked, 1);
    }

    #[test]
    fn closest_match_wins_by_default() {
        let t = tracker();
        let mut store = ObjectStore::new();
        let far = store.create(&fish(200.0, 200.0, 600.0), 1);
        let near = store.create(&fish(230.0, 200.0, 600.0), 1);
        store.transition(far, ObjectState::Potential, ObjectState::Moving);
        store.transition(near, ObjectState::Potential, ObjectState::Moving);

        let out = t.update(&mut store, 2, DIMS, &[fish(225.0, 200.0, 600.0)]);

        assert_eq!(out.updated, vec![near]);
        assert_eq!(store.get(far).unwrap().frames_tracked, 1);
        assert_eq!(store.get(near).unwrap().frames_tracked, 2);
    }

    #[test]
    fn equidistant_matches_break_ties_by_id() {
        let t = tracker();
        let mut store = ObjectStore::new();
        let left = store.create(&fish(190.0, 200.0, 600.0), 1);
        let right = store.create(&fish(210.0, 200.0, 600.0), 1);
        store.transition(left, ObjectState::Potential, ObjectState::Moving);
        store.transition(right, ObjectState::Potential, ObjectState::Moving);

        let out = t.update(&mut store, 2, DIMS, &[fish(200.0, 200.0, 600.0)]);

        assert_eq!(out.updated, vec![left]);
    }

    #[test]
    fn all_policy_updates_every_match() {
        let mut config = TrackerConfig::default();
        config.shape.multi_match = MultiMatchPolicy::All;
        let t = ShapeFeatureTracker::new(&config);
        let mut store = ObjectStore::new();
        let a = store.create(&fish(200.0, 200.0, 600.0), 1);
        let b = store.create(&fish(230.0, 200.0, 600.0), 1);
        store.transition(a, ObjectState::Potential, ObjectState::Moving);
        store.transition(b, ObjectState::Potential, ObjectState::Moving);

        let out = t.update(&mut store, 2, DIMS, &[fish(215.0, 200.0, 600.0)]);

        assert_eq!(out.updated, vec![a, b]);
        assert_eq!(store.get(a).unwrap().bbox, store.get(b).unwrap().bbox);
    }

    #[test]
    fn all_policy_keeps_one_of_merged_candidates() {
        let mut config = TrackerConfig::default();
        config.shape.multi_match = MultiMatchPolicy::All;
        let t = ShapeFeatureTracker::new(&config);
        let mut store = ObjectStore::new();
        let a = store.create(&fish(200.0, 200.0, 600.0), 1);
        let b = store.create(&fish(230.0, 200.0, 600.0), 1);

        let out = t.update(&mut store, 2, DIMS, &[fish(215.0, 200.0, 600.0)]);

        assert_eq!(out.updated, vec![a, b]);
        let pruned: Vec<_> = out.pruned.iter().map(|p| (p.id, p.rule)).collect();
        assert_eq!(pruned, vec![(b, PruneRule::Subsumed)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(a).unwrap().frames_tracked, 2);
    }
}
