use crate::error::DispatchError;
use engine_config::settings::CommandSettings;
use engine_core::connectors::{command::CommandChannel, meta::MetaClient};
use futures::future::join_all;
use model::cluster::{
    command::{NodeReply, RemoteCommand},
    node::{NodeDesc, NodeRole, NodeSelector},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Scatter-gather of administrative commands over cluster nodes.
#[derive(Clone)]
pub struct CommandDispatcher {
    meta: Arc<dyn MetaClient>,
    channel: Arc<dyn CommandChannel>,
    settings: CommandSettings,
}

impl CommandDispatcher {
    pub fn new(
        meta: Arc<dyn MetaClient>,
        channel: Arc<dyn CommandChannel>,
        settings: CommandSettings,
    ) -> Self {
        Self {
            meta,
            channel,
            settings,
        }
    }

    pub fn meta(&self) -> &Arc<dyn MetaClient> {
        &self.meta
    }

    /// Meta servers first, then alive replica servers.
    pub async fn resolve_nodes(&self, selector: NodeSelector) -> Result<Vec<NodeDesc>, DispatchError> {
        let mut nodes = Vec::new();
        if selector.includes(NodeRole::MetaServer) {
            nodes.extend(
                self.meta
                    .meta_servers()
                    .into_iter()
                    .map(|addr| NodeDesc::new(NodeRole::MetaServer, addr)),
            );
        }
        if selector.includes(NodeRole::ReplicaServer) {
            let replicas = self
                .meta
                .list_alive_nodes()
                .await
                .map_err(|source| DispatchError::ListNodes {
                    role: NodeRole::ReplicaServer,
                    source,
                })?;
            nodes.extend(
                replicas
                    .into_iter()
                    .map(|addr| NodeDesc::new(NodeRole::ReplicaServer, addr)),
            );
        }
        debug!(count = nodes.len(), "Resolved command targets");
        Ok(nodes)
    }

    /// Sends `command` to every node concurrently. The result is aligned
    /// with `nodes`; a failed or timed out node does not affect the others.
    pub async fn broadcast(&self, nodes: &[NodeDesc], command: &RemoteCommand) -> Vec<NodeReply> {
        let timeout = self.settings.timeout;
        let calls = nodes.iter().map(move |node| async move {
            let call = self.channel.call(&node.address, command, timeout);
            match tokio::time::timeout(timeout, call).await {
                Ok(Ok(output)) => NodeReply::Success(output),
                Ok(Err(err)) => {
                    warn!(node = %node.address, command = %command.name, error = %err, "Remote command failed");
                    NodeReply::Failure(err.to_string())
                }
                Err(_) => {
                    warn!(node = %node.address, command = %command.name, "Remote command timed out");
                    NodeReply::Failure(format!("timed out after {:?}", timeout))
                }
            }
        });
        join_all(calls).await
    }

    pub async fn call_remote_command(
        &self,
        selector: NodeSelector,
        command: &RemoteCommand,
    ) -> Result<Vec<(NodeDesc, NodeReply)>, DispatchError> {
        let nodes = self.resolve_nodes(selector).await?;
        let replies = self.broadcast(&nodes, command).await;
        let succeeded = replies.iter().filter(|r| r.is_success()).count();
        info!(
            command = %command.name,
            nodes = nodes.len(),
            succeeded,
            "Remote command finished"
        );
        Ok(nodes.into_iter().zip(replies).collect())
    }
}
