//! Runtime representation of one session client
//!
//! A `Client` wraps the synchronized [`ClientIdentity`] with state that only
//! matters to this process:
//! - whether this is the process's own client
//! - the handle of the network endpoint bound to it, if any
//! - lobby-ready and sound-command bookkeeping
//!
//! Clients are owned by [`crate::roster::ClientRoster`]; the endpoint they
//! point to is owned by [`EndpointList`]. The endpoint handle has to be
//! released by the roster before a client is dropped.

use crate::config::LocalConfig;
use crate::endpoint::{EndpointId, EndpointList};
use crate::identity::ClientIdentity;
use crate::units::UnitRelease;
use crate::ClientId;
use log::error;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A session client and its local bookkeeping
#[derive(Debug)]
pub struct Client {
    identity: ClientIdentity,
    local: bool,
    endpoint: Option<EndpointId>,
    /// Wall-clock time of the last lobby-ready change
    last_lobby_ready_change: SystemTime,
    /// Last time a sound command was granted
    last_sound: Option<Instant>,
    sound_command_cooldown: Duration,
    muted_sound_commands: bool,
}

impl Client {
    /// Creates a non-local, unbound client with default local settings
    pub fn new(identity: ClientIdentity) -> Self {
        Self::with_config(identity, &LocalConfig::default())
    }

    /// Creates a non-local, unbound client using the sound settings of `config`
    pub fn with_config(identity: ClientIdentity, config: &LocalConfig) -> Self {
        Self {
            identity,
            local: false,
            endpoint: None,
            last_lobby_ready_change: UNIX_EPOCH,
            last_sound: None,
            sound_command_cooldown: config.sound_command_cooldown,
            muted_sound_commands: config.mute_sound_commands,
        }
    }

    pub fn id(&self) -> ClientId {
        self.identity.id()
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn is_host(&self) -> bool {
        self.identity.is_host()
    }

    pub fn endpoint(&self) -> Option<EndpointId> {
        self.endpoint
    }

    /// Flags this client as the process's own. The roster keeps this unique.
    pub fn mark_local(&mut self) {
        self.local = true;
    }

    /// Replaces the synchronized identity. Only the roster may do this since
    /// a changed id has to be re-sorted.
    pub(crate) fn set_identity(&mut self, identity: ClientIdentity) {
        self.identity = identity;
    }

    pub(crate) fn set_id(&mut self, id: ClientId) {
        self.identity.set_id(id);
    }

    pub(crate) fn bind_endpoint(&mut self, endpoint: EndpointId) {
        self.endpoint = Some(endpoint);
    }

    pub(crate) fn unbind_endpoint(&mut self) -> Option<EndpointId> {
        self.endpoint.take()
    }

    /// Updates the activation flag
    ///
    /// Turning a client on counts as activity on its endpoint, so a freshly
    /// activated remote client is not flagged idle right away.
    pub fn set_activated(
        &mut self,
        activated: bool,
        network: Option<&mut EndpointList>,
        frame: u32,
    ) {
        self.identity.set_activated(activated);
        if !activated {
            return;
        }
        if let (Some(endpoint_id), Some(network)) = (self.endpoint, network) {
            if let Some(endpoint) = network.get_mut(endpoint_id) {
                endpoint.set_last_activity(frame);
            }
        }
    }

    /// Updates the lobby-ready flag and returns the time since the previous
    /// change
    pub fn set_lobby_ready(&mut self, lobby_ready: bool) -> Duration {
        self.set_lobby_ready_at(lobby_ready, SystemTime::now())
    }

    pub fn set_lobby_ready_at(&mut self, lobby_ready: bool, now: SystemTime) -> Duration {
        self.identity.set_lobby_ready(lobby_ready);
        let elapsed = now
            .duration_since(self.last_lobby_ready_change)
            .unwrap_or(Duration::ZERO);
        self.last_lobby_ready_change = now;
        elapsed
    }

    /// Returns true if the sound-command cooldown has passed
    pub fn can_use_sound_command(&self) -> bool {
        self.can_use_sound_command_at(Instant::now())
    }

    pub fn can_use_sound_command_at(&self, now: Instant) -> bool {
        match self.last_sound {
            Some(last) => now.saturating_duration_since(last) > self.sound_command_cooldown,
            None => true,
        }
    }

    /// Grants a sound command if the cooldown allows it and records the use
    pub fn try_use_sound_command_at(&mut self, now: Instant) -> bool {
        if !self.can_use_sound_command_at(now) {
            return false;
        }
        self.last_sound = Some(now);
        true
    }

    pub fn is_muted(&self) -> bool {
        self.muted_sound_commands
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted_sound_commands = muted;
    }

    /// Releases every unit this client owns in the simulation
    pub(crate) fn remove(&mut self, units: &mut dyn UnitRelease) {
        units.release_units_owned_by(self.id(), true);
    }

    /// Seconds since the UNIX epoch of the last lobby-ready change
    pub fn last_lobby_ready_change_secs(&self) -> u64 {
        self.last_lobby_ready_change
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_secs()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(endpoint) = self.endpoint {
            error!(
                "Client {} dropped while still bound to {}",
                self.identity.id(),
                endpoint
            );
            debug_assert!(
                std::thread::panicking(),
                "client dropped with a bound network endpoint"
            );
        }
    }
}

impl Serialize for Client {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.identity.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Client {
    /// Decoded clients are never local; local-ness is a fact about this
    /// process, not part of the shared state.
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ClientIdentity::deserialize(deserializer).map(Client::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointList;
    use crate::identity::ClientIdentity;
    use assert_approx_eq::assert_approx_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Released(Vec<(ClientId, bool)>);

    impl UnitRelease for Released {
        fn release_units_owned_by(&mut self, client_id: ClientId, forced: bool) {
            self.0.push((client_id, forced));
        }
    }

    fn client(id: ClientId) -> Client {
        Client::new(ClientIdentity::new(id, "Frank", ""))
    }

    #[test]
    fn test_client_creation() {
        let client = client(4);
        assert_eq!(client.id(), 4);
        assert_eq!(client.name(), "Frank");
        assert!(!client.is_local());
        assert!(client.endpoint().is_none());
        assert!(!client.is_muted());
        assert_eq!(client.last_lobby_ready_change_secs(), 0);
    }

    #[test]
    fn test_mark_local() {
        let mut client = client(1);
        client.mark_local();
        assert!(client.is_local());
    }

    #[test]
    fn test_set_activated_refreshes_endpoint() {
        let mut network = EndpointList::new();
        let mut client = client(2);
        let endpoint = network.register(&client);
        client.bind_endpoint(endpoint);

        client.set_activated(true, Some(&mut network), 42);
        assert!(client.identity().is_activated());
        assert_eq!(network.get(endpoint).unwrap().last_activity, 42);

        // Deactivation does not count as activity
        client.set_activated(false, Some(&mut network), 50);
        assert!(!client.identity().is_activated());
        assert_eq!(network.get(endpoint).unwrap().last_activity, 42);

        client.unbind_endpoint();
    }

    #[test]
    fn test_set_activated_without_endpoint() {
        let mut client = client(2);
        client.set_activated(true, None, 10);
        assert!(client.identity().is_activated());
    }

    #[test]
    fn test_set_lobby_ready_elapsed() {
        let mut client = client(3);
        let start = UNIX_EPOCH + Duration::from_secs(1_000);

        let first = client.set_lobby_ready_at(true, start);
        assert_eq!(first, Duration::from_secs(1_000));
        assert!(client.identity().is_lobby_ready());

        let second = client.set_lobby_ready_at(false, start + Duration::from_millis(2_500));
        assert_approx_eq!(second.as_secs_f64(), 2.5, 1e-9);
        assert!(!client.identity().is_lobby_ready());
        assert_eq!(client.last_lobby_ready_change_secs(), 1_002);
    }

    #[test]
    fn test_sound_command_cooldown() {
        let config = LocalConfig {
            sound_command_cooldown: Duration::from_secs(2),
            ..LocalConfig::default()
        };
        let mut client = Client::with_config(ClientIdentity::new(1, "G", ""), &config);
        let now = Instant::now();

        assert!(client.can_use_sound_command_at(now));
        assert!(client.try_use_sound_command_at(now));
        assert!(!client.can_use_sound_command_at(now));
        assert!(!client.try_use_sound_command_at(now + Duration::from_secs(1)));
        assert!(!client.can_use_sound_command_at(now + Duration::from_secs(2)));
        assert!(client.can_use_sound_command_at(now + Duration::from_millis(2_001)));
    }

    #[test]
    fn test_muted_from_config() {
        let config = LocalConfig {
            mute_sound_commands: true,
            ..LocalConfig::default()
        };
        let mut client = Client::with_config(ClientIdentity::new(1, "G", ""), &config);
        assert!(client.is_muted());
        client.set_muted(false);
        assert!(!client.is_muted());
    }

    #[test]
    fn test_remove_releases_units() {
        let units = Rc::new(RefCell::new(Released::default()));
        let mut handle = Rc::clone(&units);
        let mut client = client(8);
        client.remove(&mut handle);
        assert_eq!(units.borrow().0, vec![(8, true)]);
    }

    #[test]
    fn test_deserialized_client_is_not_local() {
        let mut client = client(5);
        client.mark_local();
        let json = serde_json::to_string(&client).unwrap();
        let decoded: Client = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.identity(), client.identity());
        assert!(!decoded.is_local());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "bound network endpoint")]
    fn test_drop_with_endpoint_panics_in_debug() {
        let mut client = client(6);
        client.bind_endpoint(EndpointId(1));
        drop(client);
    }
}
