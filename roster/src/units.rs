use crate::ClientId;
use std::cell::RefCell;
use std::rc::Rc;

/// Simulation-side seam for units owned by a client
///
/// Called when a client leaves the session for good so the simulation can
/// drop or hand over whatever that client controlled.
pub trait UnitRelease {
    fn release_units_owned_by(&mut self, client_id: ClientId, forced: bool);
}

impl<T: UnitRelease + ?Sized> UnitRelease for Rc<RefCell<T>> {
    fn release_units_owned_by(&mut self, client_id: ClientId, forced: bool) {
        self.borrow_mut().release_units_owned_by(client_id, forced);
    }
}

/// Simulation without units
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUnits;

impl UnitRelease for NoUnits {
    fn release_units_owned_by(&mut self, _client_id: ClientId, _forced: bool) {}
}
