//! Ordered client roster
//!
//! The roster is the single owner of every [`Client`] in a session. It keeps
//! clients strictly ascending by id, binds them to network endpoints while a
//! network is attached, and reconciles itself against snapshots received
//! from the host.
//!
//! Ascending-id order is part of the observable contract: snapshots are
//! written in that order and lobby displays list clients in it. Sessions
//! hold tens of clients, so the roster is a sorted `Vec` with linear scans.
//!
//! All mutation happens on the session's main loop. Network tasks hand their
//! events over a channel before anything here is touched.

use crate::client::Client;
use crate::config::LocalConfig;
use crate::control::{ControlCommand, ControlDispatch, DeliveryMode};
use crate::endpoint::EndpointList;
use crate::error::RosterError;
use crate::identity::ClientIdentity;
use crate::snapshot::RosterSnapshot;
use crate::units::UnitRelease;
use crate::ClientId;
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::time::Duration;

/// Ordered set of session clients
pub struct ClientRoster {
    /// Clients, strictly ascending by id
    clients: Vec<Client>,
    /// Endpoint list while networking is active
    network: Option<EndpointList>,
    units: Box<dyn UnitRelease>,
    control: Box<dyn ControlDispatch>,
    config: LocalConfig,
}

impl ClientRoster {
    /// Creates an empty roster
    ///
    /// `units` is told about clients that leave for good; `control` receives
    /// removal commands issued by the host.
    pub fn new(
        config: LocalConfig,
        units: impl UnitRelease + 'static,
        control: impl ControlDispatch + 'static,
    ) -> Self {
        Self {
            clients: Vec::new(),
            network: None,
            units: Box::new(units),
            control: Box::new(control),
            config,
        }
    }

    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    /// Resets the roster to just the local client (activated, not observing)
    pub fn init(&mut self, local_id: ClientId) -> Result<(), RosterError> {
        self.clear();
        self.insert_local(local_id, true, false)?;
        Ok(())
    }

    /// Attaches the endpoint list and binds every client to a new endpoint
    pub fn attach_network(&mut self, mut network: EndpointList) {
        self.detach_network();
        network.clear();
        for client in self.clients.iter_mut() {
            let endpoint = network.register(client);
            client.bind_endpoint(endpoint);
        }
        info!("Network attached with {} clients", self.clients.len());
        self.network = Some(network);
    }

    /// Detaches networking. Clients stay; their endpoint handles are cleared.
    ///
    /// Returns the emptied endpoint list, if one was attached.
    pub fn detach_network(&mut self) -> Option<EndpointList> {
        let mut network = self.network.take()?;
        network.clear();
        for client in self.clients.iter_mut() {
            client.unbind_endpoint();
        }
        debug!("Network detached");
        Some(network)
    }

    pub fn network(&self) -> Option<&EndpointList> {
        self.network.as_ref()
    }

    pub fn network_mut(&mut self) -> Option<&mut EndpointList> {
        self.network.as_mut()
    }

    /// Adds a client for `identity`
    ///
    /// Fails with `DuplicateIdentity` if the id is already taken; the roster
    /// is left unchanged in that case.
    pub fn insert(&mut self, identity: ClientIdentity) -> Result<&mut Client, RosterError> {
        let id = identity.id();
        if self.find_by_id(id).is_some() {
            warn!("Duplicated client ID {} ({})", id, identity.nick());
            return Err(RosterError::DuplicateIdentity(id));
        }

        info!("Client {} added", identity);
        let client = Client::with_config(identity, &self.config);
        Ok(self.add(client))
    }

    /// Adds the local client built from configuration
    ///
    /// Only one local client may exist; asking for a second one is a
    /// lifecycle bug and aborts debug builds.
    pub fn insert_local(
        &mut self,
        id: ClientId,
        activated: bool,
        observer: bool,
    ) -> Result<&mut Client, RosterError> {
        if let Some(existing) = self.local() {
            let existing = existing.id();
            debug_assert!(false, "only one local client allowed (have {})", existing);
            return Err(RosterError::LocalAlreadyExists(existing));
        }
        if self.find_by_id(id).is_some() {
            warn!("Local client ID {} already taken", id);
            return Err(RosterError::DuplicateIdentity(id));
        }

        let identity = ClientIdentity::local(id, activated, observer, &self.config);
        info!("Local client {} added", identity);
        let mut client = Client::with_config(identity, &self.config);
        client.mark_local();
        Ok(self.add(client))
    }

    /// Splices `client` in front of the first client with a greater id and
    /// registers it with the network, if any
    fn add(&mut self, mut client: Client) -> &mut Client {
        let pos = self
            .clients
            .iter()
            .position(|c| c.id() > client.id())
            .unwrap_or(self.clients.len());

        if let Some(network) = self.network.as_mut() {
            if client.endpoint().is_none() {
                let endpoint = network.register(&client);
                client.bind_endpoint(endpoint);
            }
        }

        self.clients.insert(pos, client);
        &mut self.clients[pos]
    }

    pub fn find_by_id(&self, id: ClientId) -> Option<&Client> {
        self.clients.iter().find(|c| c.id() == id)
    }

    pub fn find_by_id_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.id() == id)
    }

    /// First client with the given display name, in id order
    pub fn find_by_name(&self, name: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.name() == name)
    }

    /// Client bound to the endpoint with the given remote address
    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<&Client> {
        let endpoint = self.network.as_ref()?.find_by_addr(addr)?;
        self.find_by_id(endpoint.client_id)
    }

    pub fn local(&self) -> Option<&Client> {
        self.clients.iter().find(|c| c.is_local())
    }

    pub fn local_mut(&mut self) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.is_local())
    }

    pub fn count(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Clients in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter()
    }

    pub fn ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(|c| c.id()).collect()
    }

    /// Removes a client that is leaving the session
    ///
    /// Releases its units and deletes its endpoint.
    pub fn remove(&mut self, id: ClientId) -> Result<(), RosterError> {
        let client = self.unlink(id, false).ok_or(RosterError::NotFound(id))?;
        info!("Client {} removed", client.identity());
        Ok(())
    }

    /// Takes a client out of the ordered list
    ///
    /// A temporary unlink is a reorder, not a departure: units stay and the
    /// endpoint stays bound so the client can be re-added.
    fn unlink(&mut self, id: ClientId, temporary: bool) -> Option<Client> {
        let pos = self.clients.iter().position(|c| c.id() == id)?;
        let mut client = self.clients.remove(pos);

        if !temporary {
            client.remove(self.units.as_mut());
            if let Some(endpoint) = client.unbind_endpoint() {
                if let Some(network) = self.network.as_mut() {
                    network.delete(endpoint);
                }
            }
        }
        Some(client)
    }

    /// Gives the local client a new id and re-sorts it
    ///
    /// This is the only way an id of a client already in the roster changes.
    /// Does nothing without a local client.
    pub fn renumber_local(&mut self, new_id: ClientId) -> Result<(), RosterError> {
        let Some(old_id) = self.local().map(|c| c.id()) else {
            return Ok(());
        };
        if old_id == new_id {
            return Ok(());
        }
        if self.find_by_id(new_id).is_some() {
            warn!("Cannot renumber local client to taken ID {}", new_id);
            return Err(RosterError::DuplicateIdentity(new_id));
        }

        let Some(mut local) = self.unlink(old_id, true) else {
            return Ok(());
        };
        local.set_id(new_id);
        if let (Some(endpoint), Some(network)) = (local.endpoint(), self.network.as_mut()) {
            if let Some(endpoint) = network.get_mut(endpoint) {
                endpoint.client_id = new_id;
            }
        }
        self.add(local);
        info!("Local client renumbered {} -> {}", old_id, new_id);
        Ok(())
    }

    /// Asks every session member to remove a client
    ///
    /// Host only; other callers are ignored. The client is not removed here:
    /// a synchronized control command is dispatched and the removal happens
    /// when every member applies it.
    pub fn request_removal(&mut self, id: ClientId, reason: &str) {
        if !self.local().is_some_and(|c| c.is_host()) {
            debug!("Ignoring removal request for client {}: not host", id);
            return;
        }

        let Some(endpoint) = self.clients.iter().find(|c| c.id() == id).map(|c| c.endpoint())
        else {
            warn!("Removal requested for unknown client {}", id);
            return;
        };

        if let (Some(endpoint), Some(network)) = (endpoint, self.network.as_mut()) {
            if let Some(endpoint) = network.get_mut(endpoint) {
                endpoint.mark_for_removal();
            }
        }

        info!("Requesting removal of client {}: {}", id, reason);
        self.control.dispatch(
            ControlCommand::ClientRemove {
                client_id: id,
                reason: reason.to_string(),
            },
            DeliveryMode::Sync,
        );
    }

    /// Removes every client except the local one
    pub fn remove_all_remote(&mut self) {
        let remote: Vec<ClientId> = self
            .clients
            .iter()
            .filter(|c| !c.is_local())
            .map(|c| c.id())
            .collect();

        for id in remote {
            self.unlink(id, false);
        }
    }

    /// Brings the roster in line with a full snapshot
    ///
    /// Clients missing from the snapshot are removed. Clients present in both
    /// keep their runtime object and endpoint binding and only take over the
    /// snapshot's identity. New ids are inserted.
    pub fn reconcile_with(&mut self, snapshot: &RosterSnapshot) {
        let gone: Vec<ClientId> = self
            .clients
            .iter()
            .map(|c| c.id())
            .filter(|id| !snapshot.contains(*id))
            .collect();
        for id in gone {
            self.unlink(id, false);
        }

        for identity in snapshot.clients() {
            match self.find_by_id_mut(identity.id()) {
                Some(client) => client.set_identity(identity.clone()),
                None => {
                    if let Err(e) = self.insert(identity.clone()) {
                        warn!("Skipping snapshot client: {}", e);
                    }
                }
            }
        }
    }

    /// Detaches networking and drops every client, the local one included
    pub fn clear(&mut self) {
        self.detach_network();
        while let Some(id) = self.clients.first().map(|c| c.id()) {
            self.unlink(id, true);
        }
    }

    /// Snapshot of every identity in ascending id order
    pub fn save(&self) -> RosterSnapshot {
        RosterSnapshot::new(self.clients.iter().map(|c| c.identity().clone()).collect())
    }

    /// Replaces the whole roster with the clients of `snapshot`
    ///
    /// Loaded clients are never local. Duplicated ids are skipped.
    pub fn load(&mut self, snapshot: &RosterSnapshot) {
        self.clear();
        for identity in snapshot.clients() {
            if let Err(e) = self.insert(identity.clone()) {
                warn!("Skipping snapshot client: {}", e);
            }
        }
    }

    /// Sets the activation flag of a client, refreshing its endpoint activity
    pub fn set_activated(
        &mut self,
        id: ClientId,
        activated: bool,
        frame: u32,
    ) -> Result<(), RosterError> {
        let client = self
            .clients
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(RosterError::NotFound(id))?;
        client.set_activated(activated, self.network.as_mut(), frame);
        Ok(())
    }

    /// Sets the lobby-ready flag of a client and returns the time since its
    /// previous change
    pub fn set_lobby_ready(&mut self, id: ClientId, ready: bool) -> Result<Duration, RosterError> {
        let client = self.find_by_id_mut(id).ok_or(RosterError::NotFound(id))?;
        Ok(client.set_lobby_ready(ready))
    }
}

impl Drop for ClientRoster {
    fn drop(&mut self) {
        self.clear();
    }
}
