use log::debug;
use roster::{ClientId, UnitRelease};
use std::collections::BTreeMap;

/// Peer-side view of which client controls a unit slot
#[derive(Debug, Default)]
pub struct ClientGameState {
    pub frame: u32,
    slots: BTreeMap<ClientId, u32>,
    next_slot: u32,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives every listed client a slot if it has none yet
    pub fn sync_slots(&mut self, ids: &[ClientId]) {
        for &id in ids {
            if !self.slots.contains_key(&id) {
                self.next_slot += 1;
                debug!("Slot {} assigned to client {}", self.next_slot, id);
                self.slots.insert(id, self.next_slot);
            }
        }
    }

    pub fn slot_of(&self, id: ClientId) -> Option<u32> {
        self.slots.get(&id).copied()
    }

    pub fn owners(&self) -> Vec<ClientId> {
        self.slots.keys().copied().collect()
    }
}

impl UnitRelease for ClientGameState {
    fn release_units_owned_by(&mut self, client_id: ClientId, forced: bool) {
        if let Some(slot) = self.slots.remove(&client_id) {
            debug!(
                "Slot {} of client {} released (forced: {})",
                slot, client_id, forced
            );
        }
    }
}
