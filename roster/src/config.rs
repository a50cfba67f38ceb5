use std::time::Duration;

/// Default wait between two sound commands from the same client
pub const DEFAULT_SOUND_COMMAND_COOLDOWN: Duration = Duration::from_secs(2);

/// Local settings consumed when the local client's identity is built
///
/// The binaries fill this from their command line; everything else uses
/// `LocalConfig::default()`.
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Display name of the local client
    pub local_name: String,
    /// Nickname of the local client, empty to reuse the display name
    pub nick: String,
    /// Minimum time between two granted sound commands
    pub sound_command_cooldown: Duration,
    /// Whether sound commands start out muted
    pub mute_sound_commands: bool,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            local_name: "Player".to_string(),
            nick: String::new(),
            sound_command_cooldown: DEFAULT_SOUND_COMMAND_COOLDOWN,
            mute_sound_commands: false,
        }
    }
}

impl LocalConfig {
    pub fn with_names(local_name: &str, nick: &str) -> Self {
        Self {
            local_name: local_name.to_string(),
            nick: nick.to_string(),
            ..Self::default()
        }
    }
}
