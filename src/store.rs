use crate::object::{ObjectId, ObjectState, TrackedObject};
use crate::region::Region;

/// Owner of every tracked object.
///
/// Each object carries its own [`ObjectState`], so an object can never belong
/// to two stages at once. Objects are kept in creation order.
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: Vec<TrackedObject>,
    next_id: u32,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Vec::with_capacity(64),
            next_id: 1,
        }
    }

    /// Creates a potential object from an unmatched region.
    pub fn create(&mut self, region: &Region, frame_number: u64) -> ObjectId {
        let id = ObjectId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.objects.push(TrackedObject::new(id, region, frame_number));

        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.iter()
    }

    #[inline]
    pub fn in_state(&self, state: ObjectState) -> impl Iterator<Item = &TrackedObject> {
        self.objects.iter().filter(move |o| o.state == state)
    }

    /// Moving and stationary objects.
    #[inline]
    pub fn counted(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.iter().filter(|o| o.state.is_counted())
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.counted().count()
    }

    pub fn get(&self, id: ObjectId) -> Option<&TrackedObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut TrackedObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Moves `id` from `from` to `to`; returns false if it was not in `from`.
    pub fn transition(&mut self, id: ObjectId, from: ObjectState, to: ObjectState) -> bool {
        match self.get_mut(id) {
            Some(obj) if obj.state == from => {
                obj.state = to;
                true
            }
            _ => false,
        }
    }

    /// Removes the given potential objects. Counted objects are never removed.
    pub fn discard(&mut self, ids: &[ObjectId]) -> Vec<TrackedObject> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.objects.len());

        for obj in self.objects.drain(..) {
            if obj.state == ObjectState::Potential && ids.contains(&obj.id) {
                removed.push(obj);
            } else {
                kept.push(obj);
            }
        }

        self.objects = kept;
        removed
    }
}
