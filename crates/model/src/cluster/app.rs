use crate::core::identifiers::{AppId, NodeAddress, PartitionIndex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppStatus {
    Available,
    Creating,
    Dropping,
    Dropped,
}

/// Table as reported by the meta server's app listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub app_id: AppId,
    pub app_name: String,
    pub partition_count: i32,
    pub status: AppStatus,
}

/// Current replica assignment of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionConfiguration {
    pub partition_index: PartitionIndex,
    pub primary: Option<NodeAddress>,
    #[serde(default)]
    pub secondaries: Vec<NodeAddress>,
}

impl PartitionConfiguration {
    pub fn is_primary(&self, node: &NodeAddress) -> bool {
        self.primary.as_ref() == Some(node)
    }
}

/// Result of listing a single table: its id, partition count and assignments
/// indexed by partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPartitions {
    pub app_id: AppId,
    pub partition_count: i32,
    pub partitions: Vec<PartitionConfiguration>,
}

impl AppPartitions {
    pub fn get(&self, partition_index: PartitionIndex) -> Option<&PartitionConfiguration> {
        usize::try_from(partition_index)
            .ok()
            .and_then(|idx| self.partitions.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(idx: i32, primary: Option<&str>) -> PartitionConfiguration {
        PartitionConfiguration {
            partition_index: idx,
            primary: primary.map(NodeAddress::from),
            secondaries: vec![],
        }
    }

    #[test]
    fn test_is_primary() {
        let pc = partition(0, Some("n1:1"));
        assert!(pc.is_primary(&NodeAddress::from("n1:1")));
        assert!(!pc.is_primary(&NodeAddress::from("n2:1")));
        assert!(!partition(0, None).is_primary(&NodeAddress::from("n1:1")));
    }

    #[test]
    fn test_get_rejects_out_of_range() {
        let listed = AppPartitions {
            app_id: 1,
            partition_count: 1,
            partitions: vec![partition(0, None)],
        };
        assert!(listed.get(0).is_some());
        assert!(listed.get(1).is_none());
        assert!(listed.get(-1).is_none());
    }
}
