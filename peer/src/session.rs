//! Peer-side session logic
//!
//! A peer starts with a roster holding only itself under the unknown id.
//! Once the host accepts it, the local client is renumbered to the assigned
//! id and every roster broadcast is reconciled into the local roster.

use crate::game::ClientGameState;
use log::{debug, info, warn};
use roster::{
    ClientId, ClientRoster, ControlQueue, LocalConfig, Packet, RosterError, CLIENT_ID_UNKNOWN,
    PROTOCOL_VERSION,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Joining,
    Joined(ClientId),
    Rejected(String),
    Removed(String),
}

pub struct PeerSession {
    roster: ClientRoster,
    game: Rc<RefCell<ClientGameState>>,
    state: ConnectionState,
}

impl PeerSession {
    pub fn new(config: LocalConfig) -> Result<Self, RosterError> {
        let game = Rc::new(RefCell::new(ClientGameState::new()));
        // Peers never issue control commands; the queue only satisfies the roster
        let mut roster = ClientRoster::new(config, Rc::clone(&game), ControlQueue::new());
        roster.init(CLIENT_ID_UNKNOWN)?;

        Ok(Self {
            roster,
            game,
            state: ConnectionState::Joining,
        })
    }

    pub fn roster(&self) -> &ClientRoster {
        &self.roster
    }

    pub fn game(&self) -> std::cell::Ref<'_, ClientGameState> {
        self.game.borrow()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn client_id(&self) -> Option<ClientId> {
        match self.state {
            ConnectionState::Joined(id) => Some(id),
            _ => None,
        }
    }

    /// True once the host turned us away or removed us
    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Rejected(_) | ConnectionState::Removed(_)
        )
    }

    /// Join request announcing the local identity
    pub fn join_packet(&self) -> Option<Packet> {
        let identity = self.roster.local()?.identity().clone();
        Some(Packet::Join {
            version: PROTOCOL_VERSION,
            identity,
        })
    }

    pub fn lobby_ready_packet(&self, ready: bool) -> Option<Packet> {
        self.client_id().map(|_| Packet::SetLobbyReady { ready })
    }

    pub fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Accepted { client_id } => self.handle_accepted(client_id),

            Packet::RosterUpdate { snapshot } => {
                if self.client_id().is_none() {
                    debug!("Ignoring roster update before being accepted");
                    return;
                }
                self.roster.reconcile_with(&snapshot);
                self.game.borrow_mut().sync_slots(&self.roster.ids());
                debug!("Roster reconciled: {:?}", self.roster.ids());
            }

            Packet::ClientRemoved { client_id, reason } => {
                if Some(client_id) == self.client_id() {
                    warn!("Removed from session: {}", reason);
                    self.roster.remove_all_remote();
                    self.state = ConnectionState::Removed(reason);
                    return;
                }
                match self.roster.remove(client_id) {
                    Ok(()) => info!("Client {} left: {}", client_id, reason),
                    Err(e) => debug!("Ignoring removal: {}", e),
                }
            }

            Packet::Rejected { reason } => {
                warn!("Join rejected: {}", reason);
                self.state = ConnectionState::Rejected(reason);
            }

            _ => {
                warn!("Unexpected packet type from host");
            }
        }
    }

    fn handle_accepted(&mut self, client_id: ClientId) {
        if let Some(current) = self.client_id() {
            if current != client_id {
                warn!("Host reassigned id {} -> {}", current, client_id);
            }
        }

        // A stale remote copy of our new id has to go first
        if self.roster.renumber_local(client_id).is_err() {
            if let Err(e) = self.roster.remove(client_id) {
                warn!("Cannot take id {}: {}", client_id, e);
                return;
            }
            if let Err(e) = self.roster.renumber_local(client_id) {
                warn!("Cannot take id {}: {}", client_id, e);
                return;
            }
        }

        info!("Joined session as client {}", client_id);
        self.state = ConnectionState::Joined(client_id);
        self.game.borrow_mut().sync_slots(&self.roster.ids());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster::{ClientIdentity, RosterSnapshot, CLIENT_ID_HOST};

    fn session() -> PeerSession {
        PeerSession::new(LocalConfig::with_names("Kim", "kimmy")).unwrap()
    }

    fn snapshot(ids: &[ClientId]) -> RosterSnapshot {
        RosterSnapshot::new(
            ids.iter()
                .map(|&id| ClientIdentity::new(id, &format!("Client{}", id), ""))
                .collect(),
        )
    }

    #[test]
    fn test_new_session() {
        let session = session();
        assert_eq!(session.state(), &ConnectionState::Joining);
        assert_eq!(session.roster().ids(), vec![CLIENT_ID_UNKNOWN]);
        assert!(session.lobby_ready_packet(true).is_none());

        match session.join_packet() {
            Some(Packet::Join { version, identity }) => {
                assert_eq!(version, PROTOCOL_VERSION);
                assert_eq!(identity.name(), "Kim");
                assert_eq!(identity.nick(), "kimmy");
            }
            other => panic!("expected join packet, got {:?}", other),
        }
    }

    #[test]
    fn test_accept_renumbers_local() {
        let mut session = session();
        session.handle_packet(Packet::Accepted { client_id: 3 });

        assert_eq!(session.client_id(), Some(3));
        assert_eq!(session.roster().local().unwrap().id(), 3);
        assert_eq!(session.roster().ids(), vec![3]);
        assert_eq!(
            session.lobby_ready_packet(true),
            Some(Packet::SetLobbyReady { ready: true })
        );
    }

    #[test]
    fn test_roster_update_before_accept_ignored() {
        let mut session = session();
        session.handle_packet(Packet::RosterUpdate {
            snapshot: snapshot(&[0, 1]),
        });
        assert_eq!(session.roster().ids(), vec![CLIENT_ID_UNKNOWN]);
    }

    #[test]
    fn test_roster_update_reconciles() {
        let mut session = session();
        session.handle_packet(Packet::Accepted { client_id: 2 });
        session.handle_packet(Packet::RosterUpdate {
            snapshot: snapshot(&[0, 1, 2]),
        });

        assert_eq!(session.roster().ids(), vec![0, 1, 2]);
        assert!(session.roster().local().unwrap().id() == 2);
        assert!(session.roster().find_by_id(CLIENT_ID_HOST).unwrap().is_host());
        assert_eq!(session.game().owners(), vec![0, 1, 2]);

        session.handle_packet(Packet::RosterUpdate {
            snapshot: snapshot(&[0, 2, 4]),
        });
        assert_eq!(session.roster().ids(), vec![0, 2, 4]);
        assert!(session.game().slot_of(1).is_none());
    }

    #[test]
    fn test_accept_replaces_stale_copy() {
        let mut session = session();
        session.handle_packet(Packet::Accepted { client_id: 1 });
        session.handle_packet(Packet::RosterUpdate {
            snapshot: snapshot(&[0, 1, 5]),
        });

        // Host moved us to a new id that the old roster still lists
        session.handle_packet(Packet::Accepted { client_id: 5 });
        assert_eq!(session.client_id(), Some(5));
        assert_eq!(session.roster().local().unwrap().id(), 5);
        assert_eq!(session.roster().ids(), vec![0, 5]);
    }

    #[test]
    fn test_client_removed() {
        let mut session = session();
        session.handle_packet(Packet::Accepted { client_id: 2 });
        session.handle_packet(Packet::RosterUpdate {
            snapshot: snapshot(&[0, 1, 2]),
        });

        session.handle_packet(Packet::ClientRemoved {
            client_id: 1,
            reason: "timeout".to_string(),
        });
        assert_eq!(session.roster().ids(), vec![0, 2]);
        assert!(!session.is_finished());

        // Unknown ids are ignored
        session.handle_packet(Packet::ClientRemoved {
            client_id: 9,
            reason: "timeout".to_string(),
        });
        assert_eq!(session.roster().ids(), vec![0, 2]);
    }

    #[test]
    fn test_removed_self() {
        let mut session = session();
        session.handle_packet(Packet::Accepted { client_id: 2 });
        session.handle_packet(Packet::RosterUpdate {
            snapshot: snapshot(&[0, 1, 2]),
        });

        session.handle_packet(Packet::ClientRemoved {
            client_id: 2,
            reason: "kicked".to_string(),
        });
        assert_eq!(session.state(), &ConnectionState::Removed("kicked".to_string()));
        assert!(session.is_finished());
        assert_eq!(session.roster().ids(), vec![2]);
    }

    #[test]
    fn test_rejected() {
        let mut session = session();
        session.handle_packet(Packet::Rejected {
            reason: "Server full".to_string(),
        });
        assert!(session.is_finished());
        assert!(session.client_id().is_none());
    }
}
