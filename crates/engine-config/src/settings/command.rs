use crate::settings::error::SettingsError;
use std::time::Duration;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings of remote command broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSettings {
    /// Per-node deadline of one command call.
    pub timeout: Duration,
}

impl CommandSettings {
    pub fn new(timeout: Duration) -> Result<Self, SettingsError> {
        if timeout.is_zero() {
            return Err(SettingsError::invalid("command_timeout", "must be positive"));
        }
        Ok(Self { timeout })
    }
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}
