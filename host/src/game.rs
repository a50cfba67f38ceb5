use log::info;
use roster::{ClientId, UnitRelease};
use std::collections::HashMap;

/// A unit controlled by one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: u32,
    pub owner: ClientId,
}

/// Host-side simulation state: which client controls which units
#[derive(Debug, Default)]
pub struct GameState {
    pub frame: u32,
    units: HashMap<ClientId, Vec<Unit>>,
    next_unit_id: u32,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `owner` a new unit and returns its id
    pub fn add_unit(&mut self, owner: ClientId) -> u32 {
        self.next_unit_id += 1;
        let unit = Unit {
            id: self.next_unit_id,
            owner,
        };

        info!("Added unit {} for client {}", unit.id, owner);
        self.units.entry(owner).or_default().push(unit);
        self.next_unit_id
    }

    pub fn units_of(&self, owner: ClientId) -> &[Unit] {
        self.units.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn unit_count(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }
}

impl UnitRelease for GameState {
    fn release_units_owned_by(&mut self, client_id: ClientId, forced: bool) {
        if let Some(units) = self.units.remove(&client_id) {
            info!(
                "Released {} units of client {}{}",
                units.len(),
                client_id,
                if forced { " (forced)" } else { "" }
            );
        }
    }
}
