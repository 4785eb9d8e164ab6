use thiserror::Error;

/// Errors raised while building or loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A setting is outside its accepted range or combination.
    #[error("Invalid setting `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },

    /// An environment override could not be parsed.
    #[error("Invalid value `{value}` for {key}")]
    InvalidValue { key: String, value: String },

    /// An env file line is not `KEY=VALUE`.
    #[error("Invalid env file: {0}")]
    EnvFile(String),

    #[error("Failed to read env file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SettingsError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SettingsError::Invalid {
            name,
            reason: reason.into(),
        }
    }
}
