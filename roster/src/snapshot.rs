//! Full roster snapshots
//!
//! A snapshot is the list of identity records of every client, in ascending
//! id order when produced by [`crate::roster::ClientRoster::save`]. Readers
//! must not rely on that order: loading re-sorts through ordered insertion.
//!
//! Two encodings are provided:
//! - bincode for the UDP wire protocol (length-prefixed record list)
//! - JSON for stored snapshots, where every record field is optional

use crate::identity::ClientIdentity;
use crate::ClientId;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("binary snapshot error: {0}")]
    Binary(#[from] bincode::Error),

    #[error("json snapshot error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ordered list of client identity records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    #[serde(rename = "Client", default)]
    clients: Vec<ClientIdentity>,
}

impl RosterSnapshot {
    pub fn new(clients: Vec<ClientIdentity>) -> Self {
        Self { clients }
    }

    pub fn clients(&self) -> &[ClientIdentity] {
        &self.clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.iter().any(|c| c.id() == id)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(data)?)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }
}
