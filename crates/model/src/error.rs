use thiserror::Error;

/// Errors raised while decoding a per-partition metric wire name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetricNameError {
    #[error("metric name '{0}' has no '@' separator")]
    MissingAt(String),

    #[error("metric name '{0}' has a malformed '<app_id>.<partition_index>' suffix")]
    BadSuffix(String),

    #[error("metric name '{0}' has no '*' separator before '@'")]
    MissingStar(String),
}

/// A counter id that does not map to any stat row column.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown counter '{0}'")]
pub struct UnknownCounter(pub String);

/// A textual value that does not name any variant of an enum.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
