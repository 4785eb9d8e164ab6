use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Numeric id the meta server assigns to a table.
pub type AppId = i32;

/// Index of a partition inside its table, `0..partition_count`.
pub type PartitionIndex = i32;

/// `host:port` of a cluster node, compared textually.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeAddress(Arc<str>);

impl NodeAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(Arc::from(addr.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NodeAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for NodeAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
