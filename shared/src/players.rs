//! Fixed-capacity table of player slots, indexed by player id.

use crate::{Position, MAX_PLAYERS};
use serde::{Deserialize, Serialize};

pub type PlayerId = usize;

/// One slot of the table. The position of an inactive slot is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub active: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTable {
    slots: [PlayerSlot; MAX_PLAYERS],
}

impl PlayerTable {
    pub fn new() -> Self {
        Self {
            slots: [PlayerSlot::default(); MAX_PLAYERS],
        }
    }

    pub fn is_valid_id(id: PlayerId) -> bool {
        id < MAX_PLAYERS
    }

    /// Marks the slot active at `position`. Returns false for an invalid id.
    pub fn set_active(&mut self, id: PlayerId, position: Position) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.active = true;
                slot.position = position;
                true
            }
            None => false,
        }
    }

    /// Marks the slot inactive, leaving its stored position untouched.
    pub fn clear(&mut self, id: PlayerId) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.active = false;
                true
            }
            None => false,
        }
    }

    /// Overwrites the position of an active slot.
    pub fn update_position(&mut self, id: PlayerId, position: Position) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) if slot.active => {
                slot.position = position;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: PlayerId) -> Option<Position> {
        self.slots
            .get(id)
            .filter(|slot| slot.active)
            .map(|slot| slot.position)
    }

    pub fn is_active(&self, id: PlayerId) -> bool {
        self.slots.get(id).is_some_and(|slot| slot.active)
    }

    pub fn slot(&self, id: PlayerId) -> Option<&PlayerSlot> {
        self.slots.get(id)
    }

    /// Active players in id order.
    pub fn active(&self) -> impl Iterator<Item = (PlayerId, Position)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(id, slot)| (id, slot.position))
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active).count()
    }

    pub fn reset(&mut self) {
        self.slots = [PlayerSlot::default(); MAX_PLAYERS];
    }
}

impl Default for PlayerTable {
    fn default() -> Self {
        Self::new()
    }
}
