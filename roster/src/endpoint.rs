//! Network-side endpoint list
//!
//! An `Endpoint` is the transport-level record of a live connection to a
//! client. The `EndpointList` owns every endpoint; clients only hold an
//! `EndpointId` handle and must give it up before they are dropped.
//!
//! Activity is tracked in simulation frames rather than wall-clock time so
//! that a freshly activated client counts as active at the frame it was
//! activated on.

use crate::client::Client;
use crate::ClientId;
use log::debug;
use std::fmt;
use std::net::SocketAddr;

/// Handle to an endpoint owned by an [`EndpointList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(pub u32);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "endpoint#{}", self.0)
    }
}

/// Connection state of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointStatus {
    Connected,
    /// Graceful teardown requested; removal is pending
    Remove,
}

/// Transport record for one client
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub id: EndpointId,
    /// Client this endpoint was registered for
    pub client_id: ClientId,
    /// Remote address, once the transport knows it
    pub addr: Option<SocketAddr>,
    /// Frame of the last observed activity
    pub last_activity: u32,
    pub status: EndpointStatus,
}

impl Endpoint {
    pub fn set_last_activity(&mut self, frame: u32) {
        self.last_activity = frame;
    }

    pub fn mark_for_removal(&mut self) {
        self.status = EndpointStatus::Remove;
    }

    pub fn is_pending_removal(&self) -> bool {
        self.status == EndpointStatus::Remove
    }

    /// True if nothing was heard from this endpoint for more than
    /// `timeout_frames` frames
    pub fn is_idle(&self, frame: u32, timeout_frames: u32) -> bool {
        frame.saturating_sub(self.last_activity) > timeout_frames
    }
}

impl Default for EndpointList {
    fn default() -> Self {
        Self::new()
    }
}

/// Owner of all endpoints of a session
#[derive(Debug)]
pub struct EndpointList {
    endpoints: Vec<Endpoint>,
    next_endpoint_id: u32,
}

impl EndpointList {
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            next_endpoint_id: 1,
        }
    }

    /// Creates an endpoint for `client` and returns its handle
    pub fn register(&mut self, client: &Client) -> EndpointId {
        let id = EndpointId(self.next_endpoint_id);
        self.next_endpoint_id += 1;

        self.endpoints.push(Endpoint {
            id,
            client_id: client.id(),
            addr: None,
            last_activity: 0,
            status: EndpointStatus::Connected,
        });
        debug!("Registered {} for client {}", id, client.id());
        id
    }

    /// Deletes an endpoint. Returns false if it was already gone.
    pub fn delete(&mut self, id: EndpointId) -> bool {
        match self.endpoints.iter().position(|e| e.id == id) {
            Some(index) => {
                let endpoint = self.endpoints.remove(index);
                debug!("Deleted {} of client {}", id, endpoint.client_id);
                true
            }
            None => false,
        }
    }

    /// Drops every endpoint
    pub fn clear(&mut self) {
        self.endpoints.clear();
    }

    pub fn get(&self, id: EndpointId) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EndpointId) -> Option<&mut Endpoint> {
        self.endpoints.iter_mut().find(|e| e.id == id)
    }

    /// Associates a remote address with an endpoint
    pub fn bind_addr(&mut self, id: EndpointId, addr: SocketAddr) -> bool {
        match self.get_mut(id) {
            Some(endpoint) => {
                endpoint.addr = Some(addr);
                true
            }
            None => false,
        }
    }

    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.addr == Some(addr))
    }

    pub fn find_by_client(&self, client_id: ClientId) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.client_id == client_id)
    }

    /// Clients whose endpoints went idle and are not already being removed
    pub fn idle_clients(&self, frame: u32, timeout_frames: u32) -> Vec<ClientId> {
        self.endpoints
            .iter()
            .filter(|e| !e.is_pending_removal() && e.is_idle(frame, timeout_frames))
            .map(|e| e.client_id)
            .collect()
    }

    /// Client ids and addresses of every endpoint with a known address
    pub fn addrs(&self) -> Vec<(ClientId, SocketAddr)> {
        self.endpoints
            .iter()
            .filter_map(|e| e.addr.map(|addr| (e.client_id, addr)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
