//! # Client Roster Library
//!
//! Shared between the session host and its peers. Holds the bookkeeping of
//! who is in a multiplayer session:
//!
//! - [`identity::ClientIdentity`]: the synchronized identity of one client
//! - [`client::Client`]: an identity plus process-local runtime state
//! - [`roster::ClientRoster`]: the ordered set of clients, their endpoint
//!   bindings and snapshot reconciliation
//!
//! Collaborators the roster talks to but does not own are expressed as the
//! [`endpoint::EndpointList`] (transport side), [`units::UnitRelease`]
//! (simulation side) and [`control::ControlDispatch`] (synchronized
//! commands). The UDP protocol spoken between host and peers is [`Packet`].

use serde::{Deserialize, Serialize};

pub mod client;
pub mod config;
pub mod control;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod roster;
pub mod snapshot;
pub mod units;
pub mod validation;

pub use client::Client;
pub use config::LocalConfig;
pub use control::{ControlCommand, ControlDispatch, ControlQueue, DeliveryMode};
pub use endpoint::{Endpoint, EndpointId, EndpointList, EndpointStatus};
pub use error::RosterError;
pub use identity::{ClientIdentity, DiffLevel};
pub use roster::ClientRoster;
pub use snapshot::{RosterSnapshot, SnapshotError};
pub use units::{NoUnits, UnitRelease};
pub use validation::NameRules;

/// Client ids are assigned by the host
pub type ClientId = i32;

/// Id of a client that has not been assigned one yet
pub const CLIENT_ID_UNKNOWN: ClientId = -1;

/// Id of the session host
pub const CLIENT_ID_HOST: ClientId = 0;

/// Protocol version peers announce when joining
pub const PROTOCOL_VERSION: u32 = 1;

/// Largest UDP payload over IPv4; every packet has to fit in one datagram
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // Peer -> host
    Join {
        version: u32,
        identity: ClientIdentity,
    },
    Heartbeat,
    SetLobbyReady {
        ready: bool,
    },
    SetActivated {
        activated: bool,
    },
    Leave,

    // Host -> peer
    Accepted {
        client_id: ClientId,
    },
    Rejected {
        reason: String,
    },
    RosterUpdate {
        snapshot: RosterSnapshot,
    },
    ClientRemoved {
        client_id: ClientId,
        reason: String,
    },
}
