use crate::error::TransportError;
use async_trait::async_trait;
use model::{cluster::command::RemoteCommand, core::identifiers::NodeAddress};
use std::time::Duration;

/// RPC path for administrative commands.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    async fn call(
        &self,
        node: &NodeAddress,
        command: &RemoteCommand,
        timeout: Duration,
    ) -> Result<String, TransportError>;
}
