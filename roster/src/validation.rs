//! Name validation shared by locally configured and network-received identities
//!
//! Both paths run through the same rules so a name typed into the local
//! configuration ends up byte-for-byte identical to the same name decoded
//! from a peer's snapshot.

/// Nickname substituted when neither the configured nick nor the display name
/// survives validation.
pub const DEFAULT_NICK: &str = "Unknown";

/// Maximum name length in characters
pub const MAX_NAME_LENGTH: usize = 30;

/// Character rules applied to display names and nicknames
///
/// Every identity uses `NameRules::default()`, whether it is built locally,
/// constructed for a remote client or decoded from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRules {
    /// Names are truncated to this many characters
    pub max_len: usize,
    /// Characters removed from names in addition to control characters
    pub forbidden: Vec<char>,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            max_len: MAX_NAME_LENGTH,
            forbidden: vec!['"', '<', '>', '|', '\\'],
        }
    }
}

impl NameRules {
    /// Validates a free-form name
    ///
    /// Strips control and forbidden characters, trims surrounding
    /// whitespace and truncates to `max_len`. The result may be empty.
    pub fn validate(&self, raw: &str) -> String {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_control() && !self.forbidden.contains(c))
            .collect();

        cleaned
            .trim()
            .chars()
            .take(self.max_len)
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    /// Validates a name that must not end up empty
    ///
    /// Falls back to [`DEFAULT_NICK`] when nothing is left after validation.
    pub fn validate_non_empty(&self, raw: &str) -> String {
        let name = self.validate(raw);
        if name.is_empty() {
            DEFAULT_NICK.to_string()
        } else {
            name
        }
    }

    /// Picks the nickname for an identity: the validated nick when there is
    /// one, otherwise the validated display name, otherwise [`DEFAULT_NICK`].
    pub fn nick_or_name(&self, nick: &str, name: &str) -> String {
        let nick = self.validate(nick);
        if nick.is_empty() {
            self.validate_non_empty(name)
        } else {
            nick
        }
    }
}
