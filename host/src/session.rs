//! Host-side session logic
//!
//! `HostSession` is the authoritative roster of a session. It turns incoming
//! peer packets into roster operations and produces the packets that have to
//! go out in response. It performs no I/O itself; `network::Server` feeds it
//! from the socket and ships what it returns.
//!
//! Removals are never applied where they are decided. Leaving peers and idle
//! endpoints are turned into synchronized control commands, which are
//! applied at the start of the next tick and announced to every peer.

use crate::game::GameState;
use log::{debug, info, warn};
use roster::{
    ClientId, ClientIdentity, ClientRoster, ControlCommand, ControlQueue, EndpointList,
    LocalConfig, Packet, RosterError, RosterSnapshot, CLIENT_ID_HOST, CLIENT_ID_UNKNOWN,
    MAX_DATAGRAM_SIZE, PROTOCOL_VERSION,
};
use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;

/// Outgoing packets produced by the session
#[derive(Debug, Clone, PartialEq)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        addrs: Vec<SocketAddr>,
    },
}

/// Authoritative session state kept by the host
pub struct HostSession {
    roster: ClientRoster,
    game: Rc<RefCell<GameState>>,
    control: Rc<RefCell<ControlQueue>>,
    max_clients: usize,
    idle_timeout_frames: u32,
    next_client_id: ClientId,
    roster_dirty: bool,
}

impl HostSession {
    /// Creates a session whose only client is the local host
    pub fn new(
        config: LocalConfig,
        max_clients: usize,
        idle_timeout_frames: u32,
    ) -> Result<Self, RosterError> {
        let game = Rc::new(RefCell::new(GameState::new()));
        let control = Rc::new(RefCell::new(ControlQueue::new()));

        let mut roster = ClientRoster::new(config, Rc::clone(&game), Rc::clone(&control));
        roster.init(CLIENT_ID_HOST)?;
        roster.attach_network(EndpointList::new());
        game.borrow_mut().add_unit(CLIENT_ID_HOST);

        Ok(Self {
            roster,
            game,
            control,
            max_clients,
            idle_timeout_frames,
            next_client_id: CLIENT_ID_HOST + 1,
            roster_dirty: false,
        })
    }

    pub fn roster(&self) -> &ClientRoster {
        &self.roster
    }

    pub fn game(&self) -> std::cell::Ref<'_, GameState> {
        self.game.borrow()
    }

    pub fn frame(&self) -> u32 {
        self.game.borrow().frame
    }

    /// Number of connected peers, not counting the host
    pub fn peer_count(&self) -> usize {
        self.roster.iter().filter(|c| !c.is_local()).count()
    }

    /// Processes one packet from `addr`
    pub fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) -> Vec<GameMessage> {
        let frame = self.frame();
        let sender = self.roster.find_by_addr(addr).map(|c| c.id());

        // Any packet from a known peer counts as activity
        if let Some(id) = sender {
            self.touch(id, frame);
        }

        match packet {
            Packet::Join { version, identity } => self.handle_join(version, identity, addr),

            Packet::Heartbeat => Vec::new(),

            Packet::SetLobbyReady { ready } => {
                let Some(id) = sender else {
                    return self.unknown_sender(addr);
                };
                if let Ok(elapsed) = self.roster.set_lobby_ready(id, ready) {
                    info!(
                        "Client {} lobby ready: {} ({}s since last change)",
                        id,
                        ready,
                        elapsed.as_secs()
                    );
                    self.roster_dirty = true;
                }
                Vec::new()
            }

            Packet::SetActivated { activated } => {
                let Some(id) = sender else {
                    return self.unknown_sender(addr);
                };
                if self.roster.set_activated(id, activated, frame).is_ok() {
                    self.roster_dirty = true;
                }
                Vec::new()
            }

            Packet::Leave => {
                let Some(id) = sender else {
                    return self.unknown_sender(addr);
                };
                self.roster.request_removal(id, "left the session");
                Vec::new()
            }

            _ => {
                warn!("Unexpected packet type from {}", addr);
                Vec::new()
            }
        }
    }

    fn handle_join(
        &mut self,
        version: u32,
        mut identity: ClientIdentity,
        addr: SocketAddr,
    ) -> Vec<GameMessage> {
        info!("Client {} joining from {} (version {})", identity, addr, version);

        if version != PROTOCOL_VERSION {
            return vec![reject(addr, "Protocol version mismatch")];
        }

        // Join packets may be repeated; answer with the id already assigned
        if let Some(existing) = self.roster.find_by_addr(addr) {
            let client_id = existing.id();
            return vec![GameMessage::SendPacket {
                packet: Packet::Accepted { client_id },
                addr,
            }];
        }

        if self.peer_count() >= self.max_clients {
            return vec![reject(addr, "Server full")];
        }

        if identity.id() == CLIENT_ID_UNKNOWN {
            identity.set_id(self.assign_id());
        }

        // Peers receive the whole roster in a single datagram
        if !self.fits_in_datagram(&identity) {
            warn!("Refusing join from {}: roster update would not fit a datagram", addr);
            return vec![reject(addr, "Roster too large")];
        }

        let client_id = identity.id();
        let endpoint = match self.roster.insert(identity) {
            Ok(client) => client.endpoint(),
            Err(e) => {
                warn!("Refusing join from {}: {}", addr, e);
                return vec![reject(addr, "Duplicated client ID")];
            }
        };

        let frame = self.frame();
        if let (Some(endpoint), Some(network)) = (endpoint, self.roster.network_mut()) {
            network.bind_addr(endpoint, addr);
            if let Some(endpoint) = network.get_mut(endpoint) {
                endpoint.set_last_activity(frame);
            }
        }
        self.game.borrow_mut().add_unit(client_id);
        self.roster_dirty = true;

        vec![GameMessage::SendPacket {
            packet: Packet::Accepted { client_id },
            addr,
        }]
    }

    /// Whether the roster update still fits in one datagram with `joining` added
    fn fits_in_datagram(&self, joining: &ClientIdentity) -> bool {
        let mut clients = self.roster.save().clients().to_vec();
        clients.push(joining.clone());
        let packet = Packet::RosterUpdate {
            snapshot: RosterSnapshot::new(clients),
        };

        match bincode::serialized_size(&packet) {
            Ok(size) => size <= MAX_DATAGRAM_SIZE as u64,
            Err(e) => {
                warn!("Cannot size roster update: {}", e);
                false
            }
        }
    }

    fn unknown_sender(&self, addr: SocketAddr) -> Vec<GameMessage> {
        debug!("Ignoring packet from unknown address {}", addr);
        Vec::new()
    }

    fn touch(&mut self, id: ClientId, frame: u32) {
        let endpoint = self.roster.find_by_id(id).and_then(|c| c.endpoint());
        if let (Some(endpoint), Some(network)) = (endpoint, self.roster.network_mut()) {
            if let Some(endpoint) = network.get_mut(endpoint) {
                endpoint.set_last_activity(frame);
            }
        }
    }

    fn assign_id(&mut self) -> ClientId {
        while self.roster.find_by_id(self.next_client_id).is_some() {
            self.next_client_id += 1;
        }
        let id = self.next_client_id;
        self.next_client_id += 1;
        id
    }

    /// Requests removal of a peer, as a kick from the host
    pub fn kick(&mut self, id: ClientId, reason: &str) {
        self.roster.request_removal(id, reason);
    }

    /// Advances one frame
    ///
    /// Applies control commands queued during the previous frame, requests
    /// removal of idle peers and broadcasts the roster if it changed.
    pub fn tick(&mut self) -> Vec<GameMessage> {
        let frame = {
            let mut game = self.game.borrow_mut();
            game.frame += 1;
            game.frame
        };

        let mut messages = self.apply_control();

        let local_id = self.roster.local().map(|c| c.id());
        let idle: Vec<ClientId> = self
            .roster
            .network()
            .map(|n| n.idle_clients(frame, self.idle_timeout_frames))
            .unwrap_or_default()
            .into_iter()
            .filter(|id| Some(*id) != local_id)
            .collect();
        for id in idle {
            info!("Client {} timed out at frame {}", id, frame);
            self.roster.request_removal(id, "timeout");
        }

        if self.roster_dirty {
            messages.push(self.roster_broadcast());
            self.roster_dirty = false;
        }
        messages
    }

    fn apply_control(&mut self) -> Vec<GameMessage> {
        let commands = self.control.borrow_mut().drain();
        let mut messages = Vec::new();

        for (command, mode) in commands {
            match command {
                ControlCommand::ClientRemove { client_id, reason } => {
                    let removed_addr = self
                        .roster
                        .network()
                        .and_then(|n| n.find_by_client(client_id))
                        .and_then(|e| e.addr);

                    if let Err(e) = self.roster.remove(client_id) {
                        warn!("Cannot apply removal ({:?}): {}", mode, e);
                        continue;
                    }
                    info!("Client {} removed: {}", client_id, reason);

                    let mut addrs = self.peer_addrs();
                    addrs.extend(removed_addr);
                    messages.push(GameMessage::BroadcastPacket {
                        packet: Packet::ClientRemoved { client_id, reason },
                        addrs,
                    });
                    self.roster_dirty = true;
                }
            }
        }
        messages
    }

    fn peer_addrs(&self) -> Vec<SocketAddr> {
        self.roster
            .network()
            .map(|n| n.addrs().into_iter().map(|(_, addr)| addr).collect())
            .unwrap_or_default()
    }

    fn roster_broadcast(&self) -> GameMessage {
        GameMessage::BroadcastPacket {
            packet: Packet::RosterUpdate {
                snapshot: self.roster.save(),
            },
            addrs: self.peer_addrs(),
        }
    }
}

fn reject(addr: SocketAddr, reason: &str) -> GameMessage {
    GameMessage::SendPacket {
        packet: Packet::Rejected {
            reason: reason.to_string(),
        },
        addr,
    }
}
