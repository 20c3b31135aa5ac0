//! Fixed-capacity body table
//!
//! One flat array of value structs indexed by a stable small integer. Slots are
//! recycled in place on spawn (lowest inactive index first) and never compacted,
//! so an id stays valid across unrelated deletes. Capacity is `MAX_BODIES`; a
//! spawn beyond it is refused with no partial state.

use serde::{Deserialize, Serialize};

use super::state::Body;
use crate::SimError;
use crate::consts::MAX_BODIES;

/// Stable handle to a body slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(u32);

impl BodyId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Slot index behind this id.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Slot table holding every simulated body.
#[derive(Debug, Clone, Default)]
pub struct BodyStore {
    slots: Vec<Body>,
}

impl BodyStore {
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(MAX_BODIES),
        }
    }

    /// Place `body` in the lowest inactive slot, or append if none is free.
    ///
    /// Fails with `CapacityExceeded` once all `MAX_BODIES` slots are active;
    /// the store is left untouched in that case.
    pub fn spawn(&mut self, mut body: Body) -> Result<BodyId, SimError> {
        body.active = true;
        if let Some(index) = self.slots.iter().position(|slot| !slot.active) {
            body.id = BodyId::from_index(index);
            self.slots[index] = body;
            return Ok(body.id);
        }
        if self.slots.len() >= MAX_BODIES {
            return Err(SimError::CapacityExceeded { max: MAX_BODIES });
        }
        let id = BodyId::from_index(self.slots.len());
        body.id = id;
        self.slots.push(body);
        Ok(id)
    }

    /// Mark a slot inactive; it becomes eligible for reuse by the next spawn.
    pub fn deactivate(&mut self, id: BodyId) -> Result<(), SimError> {
        let slot = self
            .slots
            .get_mut(id.index())
            .filter(|slot| slot.active)
            .ok_or(SimError::InvalidIndex(id.index()))?;
        slot.active = false;
        Ok(())
    }

    pub fn get(&self, id: BodyId) -> Result<&Body, SimError> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.active)
            .ok_or(SimError::InvalidIndex(id.index()))
    }

    pub fn get_mut(&mut self, id: BodyId) -> Result<&mut Body, SimError> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.active)
            .ok_or(SimError::InvalidIndex(id.index()))
    }

    /// All slots, active or not. Renderers and the frame phases filter on
    /// `Body::active` themselves.
    #[inline]
    pub fn slots(&self) -> &[Body] {
        &self.slots
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [Body] {
        &mut self.slots
    }

    /// Active bodies, in slot order. Stable within a frame, not across
    /// spawns/deletes in the same frame.
    pub fn iter_active(&self) -> impl Iterator<Item = &Body> {
        self.slots.iter().filter(|body| body.active)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|body| body.active).count()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
