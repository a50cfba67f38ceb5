//! Synchronized identity record of one client
//!
//! `ClientIdentity` is the part of a client that travels between host and
//! peers: id, names and status flags. Local runtime state (endpoint binding,
//! timestamps) lives on [`crate::client::Client`] and never hits the wire.

use crate::config::LocalConfig;
use crate::validation::NameRules;
use crate::{ClientId, CLIENT_ID_HOST, CLIENT_ID_UNKNOWN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of the difference between two identity records
///
/// Variants are ordered from least to most severe, so `a.max(b)` picks the
/// update that has to be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiffLevel {
    /// Records are identical
    None,
    /// Same client, only activation, observer or lobby-ready status differs
    IdMatch,
    /// Same nickname but id or display name differs
    IdChange,
    /// Nicknames differ, so these are different clients
    Different,
}

/// Identity and status of one client as seen by every session member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IdentityRecord")]
pub struct ClientIdentity {
    #[serde(rename = "ID")]
    id: ClientId,
    #[serde(rename = "Activated")]
    activated: bool,
    #[serde(rename = "Observer")]
    observer: bool,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Nick")]
    nick: String,
    #[serde(rename = "LobbyReady")]
    lobby_ready: bool,
}

/// Raw record as read from a snapshot; every field is optional
#[derive(Debug, Deserialize)]
struct IdentityRecord {
    #[serde(rename = "ID", default = "unknown_id")]
    id: ClientId,
    #[serde(rename = "Activated", default)]
    activated: bool,
    #[serde(rename = "Observer", default)]
    observer: bool,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Nick", default)]
    nick: String,
    #[serde(rename = "LobbyReady", default)]
    lobby_ready: bool,
}

fn unknown_id() -> ClientId {
    CLIENT_ID_UNKNOWN
}

impl From<IdentityRecord> for ClientIdentity {
    fn from(record: IdentityRecord) -> Self {
        // Received names go through the same rules as locally configured ones
        let rules = NameRules::default();
        Self {
            id: record.id,
            activated: record.activated,
            observer: record.observer,
            nick: rules.nick_or_name(&record.nick, &record.name),
            name: rules.validate(&record.name),
            lobby_ready: record.lobby_ready,
        }
    }
}

impl ClientIdentity {
    /// Creates an inactive identity with validated names
    pub fn new(id: ClientId, name: &str, nick: &str) -> Self {
        let rules = NameRules::default();
        Self {
            id,
            activated: false,
            observer: false,
            name: rules.validate(name),
            nick: rules.nick_or_name(nick, name),
            lobby_ready: false,
        }
    }

    /// Builds the identity of the local client from configuration
    pub fn local(id: ClientId, activated: bool, observer: bool, config: &LocalConfig) -> Self {
        let rules = NameRules::default();
        let name = rules.validate(&config.local_name);
        let nick = rules.nick_or_name(&config.nick, &name);
        Self {
            id,
            activated,
            observer,
            name,
            nick,
            lobby_ready: false,
        }
    }

    /// Classifies how `other` differs from this record
    ///
    /// The nickname is chosen once and never changes within a session, so a
    /// nickname mismatch outranks everything else.
    pub fn diff_level(&self, other: &ClientIdentity) -> DiffLevel {
        if self.nick != other.nick {
            return DiffLevel::Different;
        }
        if self.id != other.id || self.name != other.name {
            return DiffLevel::IdChange;
        }
        if self.activated != other.activated
            || self.observer != other.observer
            || self.lobby_ready != other.lobby_ready
        {
            return DiffLevel::IdMatch;
        }
        DiffLevel::None
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn is_observer(&self) -> bool {
        self.observer
    }

    pub fn is_lobby_ready(&self) -> bool {
        self.lobby_ready
    }

    /// Returns true for the session host
    pub fn is_host(&self) -> bool {
        self.id == CLIENT_ID_HOST
    }

    pub fn set_id(&mut self, id: ClientId) {
        self.id = id;
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = NameRules::default().validate(name);
    }

    pub fn set_activated(&mut self, activated: bool) {
        self.activated = activated;
    }

    pub fn set_observer(&mut self, observer: bool) {
        self.observer = observer;
    }

    pub fn set_lobby_ready(&mut self, lobby_ready: bool) {
        self.lobby_ready = lobby_ready;
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, id {})", self.nick, self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ClientIdentity {
        ClientIdentity::new(3, "Alice", "ace")
    }

    #[test]
    fn test_new_falls_back_to_name() {
        let identity = ClientIdentity::new(1, "Bob", "");
        assert_eq!(identity.nick(), "Bob");
        assert_eq!(identity.name(), "Bob");
        assert!(!identity.is_activated());
    }

    #[test]
    fn test_local_from_config() {
        let config = LocalConfig::with_names("  Carol ", "");
        let identity = ClientIdentity::local(7, true, false, &config);
        assert_eq!(identity.id(), 7);
        assert_eq!(identity.name(), "Carol");
        assert_eq!(identity.nick(), "Carol");
        assert!(identity.is_activated());
        assert!(!identity.is_observer());
        assert!(!identity.is_lobby_ready());

        let config = LocalConfig::with_names("Carol", "<cc>");
        let identity = ClientIdentity::local(7, false, true, &config);
        assert_eq!(identity.nick(), "cc");
        assert!(identity.is_observer());
    }

    #[test]
    fn test_local_never_empty_nick() {
        let config = LocalConfig::with_names("", "");
        let identity = ClientIdentity::local(0, true, false, &config);
        assert_eq!(identity.name(), "");
        assert_eq!(identity.nick(), crate::validation::DEFAULT_NICK);
    }

    #[test]
    fn test_diff_level_identical() {
        assert_eq!(base().diff_level(&base()), DiffLevel::None);
    }

    #[test]
    fn test_diff_level_single_fields() {
        let mut other = ClientIdentity::new(3, "Alice", "someone");
        assert_eq!(base().diff_level(&other), DiffLevel::Different);

        other = base();
        other.set_id(4);
        assert_eq!(base().diff_level(&other), DiffLevel::IdChange);

        other = base();
        other.set_name("Alicia");
        assert_eq!(base().diff_level(&other), DiffLevel::IdChange);

        other = base();
        other.set_activated(true);
        assert_eq!(base().diff_level(&other), DiffLevel::IdMatch);

        other = base();
        other.set_observer(true);
        assert_eq!(base().diff_level(&other), DiffLevel::IdMatch);

        other = base();
        other.set_lobby_ready(true);
        assert_eq!(base().diff_level(&other), DiffLevel::IdMatch);
    }

    #[test]
    fn test_diff_level_most_severe_wins() {
        // (nick differs, id differs, status differs) -> expected level
        let cases = [
            (true, true, true, DiffLevel::Different),
            (true, true, false, DiffLevel::Different),
            (true, false, true, DiffLevel::Different),
            (false, true, true, DiffLevel::IdChange),
            (false, true, false, DiffLevel::IdChange),
            (false, false, true, DiffLevel::IdMatch),
            (false, false, false, DiffLevel::None),
        ];

        for (nick, id, status, expected) in cases {
            let mut other = if nick {
                ClientIdentity::new(3, "Alice", "other")
            } else {
                base()
            };
            if id {
                other.set_id(99);
            }
            if status {
                other.set_lobby_ready(true);
            }
            assert_eq!(
                base().diff_level(&other),
                expected,
                "nick={} id={} status={}",
                nick,
                id,
                status
            );
        }
    }

    #[test]
    fn test_diff_level_ordering() {
        assert!(DiffLevel::Different > DiffLevel::IdChange);
        assert!(DiffLevel::IdChange > DiffLevel::IdMatch);
        assert!(DiffLevel::IdMatch > DiffLevel::None);
    }

    #[test]
    fn test_activated_observer_not_exclusive() {
        let mut identity = base();
        identity.set_activated(true);
        identity.set_observer(true);
        assert!(identity.is_activated());
        assert!(identity.is_observer());
    }

    #[test]
    fn test_json_field_names_and_defaults() {
        let json = serde_json::to_value(base()).unwrap();
        assert_eq!(json["ID"], 3);
        assert_eq!(json["Nick"], "ace");
        assert_eq!(json["LobbyReady"], false);

        let decoded: ClientIdentity = serde_json::from_str(r#"{"Name": "Dave"}"#).unwrap();
        assert_eq!(decoded.id(), CLIENT_ID_UNKNOWN);
        assert_eq!(decoded.name(), "Dave");
        assert_eq!(decoded.nick(), "Dave");
        assert!(!decoded.is_activated());
        assert!(!decoded.is_observer());
        assert!(!decoded.is_lobby_ready());

        let decoded: ClientIdentity = serde_json::from_str("{}").unwrap();
        assert_eq!(decoded.name(), "");
        assert_eq!(decoded.nick(), crate::validation::DEFAULT_NICK);
    }

    #[test]
    fn test_display() {
        assert_eq!(base().to_string(), "ace (Alice, id 3)");
    }
}
