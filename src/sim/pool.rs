//! Reusable entity pools
//!
//! Every entity kind (player bullets, hostile bullets, each enemy kind,
//! crystals) lives in its own `Pool<T>`. Slots are constructed once at
//! warm-up and recycled; callers only ever hold [`Handle`]s. A handle carries
//! the slot generation, so a handle kept past its entity's release goes stale
//! instead of aliasing whatever reuses the slot.

use serde::{Deserialize, Serialize};

/// Generation-checked reference to a pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Slot index inside the owning pool
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Number of times the slot had been released when this handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Capability: the entity can flag itself for removal and be recycled
pub trait Releasable {
    /// True once the entity asked to be removed (killed, expired, off-screen)
    fn is_pending_removal(&self) -> bool;

    /// Ask the owning pool to release this entity on its next pass
    fn mark_for_removal(&mut self);

    /// Reset transient state as the slot returns to the free list.
    /// Must clear the pending-removal flag.
    fn on_release(&mut self);
}

/// Capability: the entity advances itself each frame given some context
pub trait Updatable<Ctx: ?Sized> {
    fn update(&mut self, dt: f32, ctx: &mut Ctx);
}

#[derive(Debug)]
struct Slot<T> {
    entity: T,
    generation: u32,
    /// Position inside `Pool::live` while the slot is live
    live_index: Option<usize>,
}

/// Fixed-budget allocator for one entity kind
#[derive(Debug)]
pub struct Pool<T> {
    name: &'static str,
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    live: Vec<usize>,
    initial_capacity: usize,
    growth_events: u32,
}

impl<T: Releasable + Default> Pool<T> {
    /// Create a pool and construct `initial_capacity` entities up front
    pub fn new(name: &'static str, initial_capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(initial_capacity);
        slots.extend((0..initial_capacity).map(|_| Slot {
            entity: T::default(),
            generation: 0,
            live_index: None,
        }));
        // Pop from the back, so hand out low indices first
        let free = (0..initial_capacity).rev().collect();

        Self {
            name,
            slots,
            free,
            live: Vec::with_capacity(initial_capacity),
            initial_capacity,
            growth_events: 0,
        }
    }

    /// Take a slot from the free list (growing when exhausted) and initialize it.
    ///
    /// Never fails. Exhaustion is an accepted cost, logged so it can be
    /// tuned out of the warm-up size.
    pub fn acquire(&mut self, init: impl FnOnce(&mut T)) -> Handle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.growth_events += 1;
                log::debug!(
                    "{} pool exhausted, growing to {} slots",
                    self.name,
                    self.slots.len() + 1
                );
                self.slots.push(Slot {
                    entity: T::default(),
                    generation: 0,
                    live_index: None,
                });
                self.slots.len() - 1
            }
        };

        let slot = &mut self.slots[index];
        slot.live_index = Some(self.live.len());
        init(&mut slot.entity);
        self.live.push(index);

        Handle {
            index: index as u32,
            generation: slot.generation,
        }
    }
}

impl<T: Releasable> Pool<T> {
    /// Return an entity to the free list.
    ///
    /// Stale or already-released handles are a no-op; returns whether a
    /// release actually happened.
    pub fn release(&mut self, handle: Handle) -> bool {
        if !self.contains(handle) {
            return false;
        }
        self.release_index(handle.index());
        true
    }

    /// Release every live entity
    pub fn release_all(&mut self) {
        while let Some(&index) = self.live.last() {
            self.release_index(index);
        }
    }

    /// Reap-then-step pass over the live set.
    ///
    /// Entities flagged for removal are released instead of stepped, so no
    /// entity is both updated and released in the same pass. Entities that
    /// flag themselves during `step` are released on the next pass.
    pub fn step(&mut self, mut step: impl FnMut(Handle, &mut T)) {
        // Walk backwards: `swap_remove` only moves already-visited entries
        let mut i = self.live.len();
        while i > 0 {
            i -= 1;
            let index = self.live[i];
            if self.slots[index].entity.is_pending_removal() {
                self.release_index(index);
                continue;
            }
            let slot = &mut self.slots[index];
            let handle = Handle {
                index: index as u32,
                generation: slot.generation,
            };
            step(handle, &mut slot.entity);
        }
    }

    /// Step every live entity through its [`Updatable`] implementation
    pub fn update<C: ?Sized>(&mut self, dt: f32, ctx: &mut C)
    where
        T: Updatable<C>,
    {
        self.step(|_, entity| entity.update(dt, ctx));
    }

    /// Whether `handle` refers to a currently live entity
    pub fn contains(&self, handle: Handle) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|slot| slot.generation == handle.generation && slot.live_index.is_some())
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        if self.contains(handle) {
            Some(&self.slots[handle.index()].entity)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if self.contains(handle) {
            Some(&mut self.slots[handle.index()].entity)
        } else {
            None
        }
    }

    /// Live entities, including ones already flagged for removal
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.live.iter().map(move |&index| {
            let slot = &self.slots[index];
            (
                Handle {
                    index: index as u32,
                    generation: slot.generation,
                },
                &slot.entity,
            )
        })
    }

    /// Live entities that are not flagged for removal
    pub fn iter_active(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.iter().filter(|(_, entity)| !entity.is_pending_removal())
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Total slots owned (live + free); never below the warm-up size
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// How many times `acquire` had to grow storage
    pub fn growth_events(&self) -> u32 {
        self.growth_events
    }

    fn release_index(&mut self, index: usize) {
        let Some(position) = self.slots[index].live_index.take() else {
            return;
        };

        let removed = self.live.swap_remove(position);
        debug_assert_eq!(removed, index);
        if let Some(&moved) = self.live.get(position) {
            self.slots[moved].live_index = Some(position);
        }

        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        slot.entity.on_release();
        self.free.push(index);
    }
}
