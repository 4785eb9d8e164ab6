use crate::error::MetaError;
use async_trait::async_trait;
use model::{
    cluster::app::{AppInfo, AppPartitions, AppStatus},
    core::identifiers::NodeAddress,
};

#[async_trait]
pub trait MetaClient: Send + Sync {
    /// Meta servers the client was configured with.
    fn meta_servers(&self) -> Vec<NodeAddress>;

    /// Replica servers the meta server currently considers alive.
    async fn list_alive_nodes(&self) -> Result<Vec<NodeAddress>, MetaError>;

    async fn list_apps(&self, status: AppStatus) -> Result<Vec<AppInfo>, MetaError>;

    /// Partition assignment of one table.
    async fn list_app(&self, app_name: &str) -> Result<AppPartitions, MetaError>;
}
