//! Id allocation and object recycling for one audio object kind
//!
//! Objects live in an arena of slots indexed by `id - 1`. Deleting an object
//! only flips its slot to inactive and pushes the id on a free list; the next
//! create pops that id (most recently deleted first) and reactivates the same
//! backing object. New slots are only appended when the free list is empty,
//! so issued ids are always `1..=slots.len()` and never collide.
//!
//! Ids are handed to the game as opaque handles, so a recycled id is
//! indistinguishable from the object that held it before. Each slot counts its
//! reuses to make that aliasing observable.

use std::fmt;

use crate::error::PoolError;

/// Maximum number of live buffers
pub const MAX_BUFFERS: usize = 2048;

/// Maximum number of live sources
pub const MAX_SOURCES: usize = 256;

/// Which kind of object a pool manages (for logs and errors)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Buffer,
    Source,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Buffer => f.write_str("buffer"),
            ObjectKind::Source => f.write_str("source"),
        }
    }
}

/// An object that can live in a [`ResourcePool`]
pub trait PoolObject {
    /// Construct a fresh object occupying `id`
    fn with_id(id: u32) -> Self;

    /// The id this object occupies
    fn id(&self) -> u32;

    /// Called when a recycled object is handed out again
    fn reactivate(&mut self) {}
}

struct Slot<T> {
    object: T,
    active: bool,
    reuses: u32,
}

/// Fixed-capacity pool of objects addressed by 1-based ids
pub struct ResourcePool<T> {
    kind: ObjectKind,
    capacity: usize,
    slots: Vec<Slot<T>>,
    /// Ids of inactive slots, most recently deleted last
    free: Vec<u32>,
    active: usize,
}

impl<T: PoolObject> ResourcePool<T> {
    pub fn new(kind: ObjectKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            slots: Vec::new(),
            free: Vec::new(),
            active: 0,
        }
    }

    /// Activate an object and return its id.
    ///
    /// Recycled objects are reused before a new slot is allocated.
    pub fn create(&mut self) -> Result<u32, PoolError> {
        if self.active >= self.capacity {
            return Err(PoolError::CapacityExhausted {
                kind: self.kind,
                capacity: self.capacity,
            });
        }

        if let Some(id) = self.free.pop() {
            let slot = &mut self.slots[id as usize - 1];
            slot.active = true;
            slot.reuses += 1;
            slot.object.reactivate();
            self.active += 1;
            return Ok(id);
        }

        // Every existing slot is active, so the next id is active count + 1
        let id = self.slots.len() as u32 + 1;
        self.slots.push(Slot {
            object: T::with_id(id),
            active: true,
            reuses: 0,
        });
        self.active += 1;
        Ok(id)
    }

    /// Deactivate `id`. Returns false (and does nothing) if it wasn't active.
    pub fn delete(&mut self, id: u32) -> bool {
        match self.slot_index(id) {
            Some(index) if self.slots[index].active => {
                self.slots[index].active = false;
                self.free.push(id);
                self.active -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn exists(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: u32) -> Option<&T> {
        let index = self.slot_index(id)?;
        let slot = &self.slots[index];
        slot.active.then_some(&slot.object)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        let index = self.slot_index(id)?;
        let slot = &mut self.slots[index];
        if slot.active { Some(&mut slot.object) } else { None }
    }

    /// Iterate over active objects (in slot order)
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter(|s| s.active).map(|s| &s.object)
    }

    /// Iterate mutably over active objects (in slot order)
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots
            .iter_mut()
            .filter(|s| s.active)
            .map(|s| &mut s.object)
    }

    /// Ids of all active objects, ascending
    pub fn active_ids(&self) -> Vec<u32> {
        self.iter().map(PoolObject::id).collect()
    }

    /// How many times the slot behind `id` has been recycled
    pub fn reuse_count(&self, id: u32) -> Option<u32> {
        self.slot_index(id).map(|i| self.slots[i].reuses)
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active objects
    pub fn len(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Number of deleted objects waiting to be reused
    pub fn recycled_len(&self) -> usize {
        self.free.len()
    }

    fn slot_index(&self, id: u32) -> Option<usize> {
        let index = (id as usize).checked_sub(1)?;
        (index < self.slots.len()).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker {
        id: u32,
        tag: u32,
        reactivations: u32,
    }

    impl PoolObject for Marker {
        fn with_id(id: u32) -> Self {
            Self {
                id,
                tag: 0,
                reactivations: 0,
            }
        }

        fn id(&self) -> u32 {
            self.id
        }

        fn reactivate(&mut self) {
            self.reactivations += 1;
        }
    }

    fn pool(capacity: usize) -> ResourcePool<Marker> {
        ResourcePool::new(ObjectKind::Buffer, capacity)
    }

    #[test]
    fn test_ids_start_at_one() {
        let mut p = pool(4);
        assert_eq!(p.create(), Ok(1));
        assert_eq!(p.create(), Ok(2));
        assert_eq!(p.create(), Ok(3));
        assert!(!p.exists(0));
        assert!(p.get(0).is_none());
    }

    #[test]
    fn test_delete_then_create_recycles_object() {
        let mut p = pool(4);
        let a = p.create().unwrap();
        let _b = p.create().unwrap();
        p.get_mut(a).unwrap().tag = 42;

        assert!(p.delete(a));
        assert!(!p.exists(a));
        assert_eq!(p.recycled_len(), 1);

        // Same backing object comes back with its id
        let again = p.create().unwrap();
        assert_eq!(again, a);
        let obj = p.get(again).unwrap();
        assert_eq!(obj.tag, 42);
        assert_eq!(obj.reactivations, 1);
        assert_eq!(p.reuse_count(again), Some(1));
        assert_eq!(p.recycled_len(), 0);
    }

    #[test]
    fn test_recycle_is_most_recent_first() {
        let mut p = pool(4);
        let a = p.create().unwrap();
        let b = p.create().unwrap();
        p.delete(a);
        p.delete(b);
        assert_eq!(p.create(), Ok(b));
        assert_eq!(p.create(), Ok(a));
        assert_eq!(p.create(), Ok(3));
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut p = pool(4);
        p.create().unwrap();
        assert!(!p.delete(0));
        assert!(!p.delete(7));
        assert_eq!(p.len(), 1);

        // Deleting twice only recycles once
        assert!(p.delete(1));
        assert!(!p.delete(1));
        assert_eq!(p.recycled_len(), 1);
    }

    #[test]
    fn test_capacity_ceiling() {
        let mut p = pool(3);
        for _ in 0..3 {
            p.create().unwrap();
        }
        let err = p.create().unwrap_err();
        assert_eq!(
            err,
            PoolError::CapacityExhausted {
                kind: ObjectKind::Buffer,
                capacity: 3
            }
        );
        assert_eq!(p.len(), 3);
        assert_eq!(p.recycled_len(), 0);

        // Freeing one slot makes room again
        p.delete(2);
        assert_eq!(p.create(), Ok(2));
    }

    #[test]
    fn test_churn_keeps_ids_unique_and_bounded() {
        let mut p = pool(16);
        let mut live: Vec<u32> = Vec::new();
        // Deterministic pseudo-random create/delete mix
        let mut state = 0x2545_F491u32;
        for _ in 0..5_000 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            if state % 3 != 0 {
                match p.create() {
                    Ok(id) => {
                        assert!((1..=16).contains(&id));
                        assert!(!live.contains(&id), "id {} issued twice", id);
                        live.push(id);
                    }
                    Err(_) => assert_eq!(live.len(), 16),
                }
            } else if !live.is_empty() {
                let id = live.swap_remove(state as usize % live.len());
                assert!(p.delete(id));
            }
            assert_eq!(p.len(), live.len());
        }

        let mut ids = p.active_ids();
        ids.sort_unstable();
        live.sort_unstable();
        assert_eq!(ids, live);
    }
}
