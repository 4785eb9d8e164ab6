use serde::Serialize;

pub const PERF_COUNTERS_COMMAND: &str = "perf-counters";

/// Administrative command delivered to a node's command channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteCommand {
    pub name: String,
    pub arguments: Vec<String>,
}

impl RemoteCommand {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// `perf-counters <regex>`: dump every counter whose name matches `filter`.
    pub fn perf_counters(filter: impl Into<String>) -> Self {
        Self::new(PERF_COUNTERS_COMMAND, vec![filter.into()])
    }
}

/// Outcome of a command on one node of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NodeReply {
    /// The node answered; holds the raw payload.
    Success(String),
    /// The call failed or timed out; holds the error text.
    Failure(String),
}

impl NodeReply {
    pub fn is_success(&self) -> bool {
        matches!(self, NodeReply::Success(_))
    }

    pub fn output(&self) -> &str {
        match self {
            NodeReply::Success(out) | NodeReply::Failure(out) => out,
        }
    }
}
