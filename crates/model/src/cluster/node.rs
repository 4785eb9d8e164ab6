use crate::{core::identifiers::NodeAddress, error::ParseEnumError};
use serde::Serialize;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeRole {
    MetaServer,
    ReplicaServer,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::MetaServer => "meta-server",
            NodeRole::ReplicaServer => "replica-server",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which nodes a remote command is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeSelector {
    All,
    MetaServer,
    ReplicaServer,
}

impl NodeSelector {
    pub fn includes(&self, role: NodeRole) -> bool {
        match self {
            NodeSelector::All => true,
            NodeSelector::MetaServer => role == NodeRole::MetaServer,
            NodeSelector::ReplicaServer => role == NodeRole::ReplicaServer,
        }
    }
}

impl FromStr for NodeSelector {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(NodeSelector::All),
            "meta-server" => Ok(NodeSelector::MetaServer),
            "replica-server" => Ok(NodeSelector::ReplicaServer),
            other => Err(ParseEnumError::new("node type", other)),
        }
    }
}

/// A node selected for a broadcast, tagged with the role it was selected for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDesc {
    pub role: NodeRole,
    pub address: NodeAddress,
}

impl NodeDesc {
    pub fn new(role: NodeRole, address: NodeAddress) -> Self {
        Self { role, address }
    }
}

impl fmt::Display for NodeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.role, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_includes() {
        assert!(NodeSelector::All.includes(NodeRole::MetaServer));
        assert!(NodeSelector::All.includes(NodeRole::ReplicaServer));
        assert!(!NodeSelector::MetaServer.includes(NodeRole::ReplicaServer));
        assert!(NodeSelector::ReplicaServer.includes(NodeRole::ReplicaServer));
    }

    #[test]
    fn test_selector_rejects_unknown_type() {
        assert!("replica".parse::<NodeSelector>().is_err());
        assert_eq!(
            "replica-server".parse::<NodeSelector>().unwrap(),
            NodeSelector::ReplicaServer
        );
    }
}
