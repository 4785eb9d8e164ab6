use crate::{cluster::dispatcher::CommandDispatcher, error::StatError};
use model::{
    cluster::{
        app::{AppInfo, AppPartitions, AppStatus},
        command::{NodeReply, RemoteCommand},
        node::NodeSelector,
    },
    core::identifiers::{AppId, NodeAddress},
    stats::{
        metric_name::{MetricWireName, all_apps_filter, app_filter},
        perf_counter::{PerfCounterInfo, PerfCounterMetric},
        row::{AppCounter, StatRow},
    },
};
use std::collections::HashMap;
use tracing::{error, info};

/// Folds per-partition perf counters of primary replicas into table rows
/// (all apps) or partition rows (one app).
pub struct StatAggregator {
    dispatcher: CommandDispatcher,
}

impl StatAggregator {
    pub fn new(dispatcher: CommandDispatcher) -> Self {
        Self { dispatcher }
    }

    /// One row per available app in listing order, or with `app_name` one
    /// row per partition of that app. Any failure aborts the whole run.
    pub async fn app_stat(&self, app_name: Option<&str>) -> Result<Vec<StatRow>, StatError> {
        match self.collect(app_name).await {
            Ok(rows) => {
                info!(app = app_name.unwrap_or("*"), rows = rows.len(), "Collected app stats");
                Ok(rows)
            }
            Err(err) => {
                error!(app = app_name.unwrap_or("*"), error = %err, "Collecting app stats failed");
                Err(err)
            }
        }
    }

    async fn collect(&self, app_name: Option<&str>) -> Result<Vec<StatRow>, StatError> {
        let apps = self
            .dispatcher
            .meta()
            .list_apps(AppStatus::Available)
            .await
            .map_err(StatError::ListApps)?;

        let (mut fold, filter) = match app_name {
            Some(name) => {
                let app = apps
                    .iter()
                    .find(|app| app.app_name == name)
                    .ok_or_else(|| StatError::AppNotFound(name.to_string()))?;
                let partitions = self.list_partitions(app).await?;
                (RowFold::per_partition(partitions), app_filter(app.app_id))
            }
            None => {
                let mut tables = Vec::with_capacity(apps.len());
                for app in &apps {
                    tables.push((app, self.list_partitions(app).await?));
                }
                (RowFold::per_app(tables), all_apps_filter())
            }
        };

        let nodes = self
            .dispatcher
            .resolve_nodes(NodeSelector::ReplicaServer)
            .await?;
        let replies = self
            .dispatcher
            .broadcast(&nodes, &RemoteCommand::perf_counters(filter))
            .await;

        for (node, reply) in nodes.iter().zip(replies) {
            let info = decode_reply(&node.address, reply)?;
            for metric in &info.counters {
                fold.add(&node.address, metric)?;
            }
        }
        Ok(fold.rows)
    }

    async fn list_partitions(&self, app: &AppInfo) -> Result<AppPartitions, StatError> {
        let listed = self
            .dispatcher
            .meta()
            .list_app(&app.app_name)
            .await
            .map_err(|source| StatError::ListApp {
                app_name: app.app_name.clone(),
                source,
            })?;

        let mismatch = |reason: String| StatError::AssignmentMismatch {
            app_name: app.app_name.clone(),
            reason,
        };
        if listed.app_id != app.app_id {
            return Err(mismatch(format!(
                "app id {} vs {}",
                listed.app_id, app.app_id
            )));
        }
        if listed.partition_count != app.partition_count {
            return Err(mismatch(format!(
                "partition count {} vs {}",
                listed.partition_count, app.partition_count
            )));
        }
        if usize::try_from(listed.partition_count).ok() != Some(listed.partitions.len()) {
            return Err(mismatch(format!(
                "{} partitions listed, expected {}",
                listed.partitions.len(),
                listed.partition_count
            )));
        }
        Ok(listed)
    }
}

fn decode_reply(node: &NodeAddress, reply: NodeReply) -> Result<PerfCounterInfo, StatError> {
    let payload = match reply {
        NodeReply::Success(payload) => payload,
        NodeReply::Failure(reason) => {
            return Err(StatError::NodeQuery {
                node: node.clone(),
                reason,
            });
        }
    };
    let info = PerfCounterInfo::decode(&payload).map_err(|source| StatError::Decode {
        node: node.clone(),
        source,
    })?;
    if !info.is_ok() {
        return Err(StatError::NodeResult {
            node: node.clone(),
            result: info.result,
        });
    }
    Ok(info)
}

enum Grouping {
    /// Row per app; maps app id to its row.
    PerApp(HashMap<AppId, usize>),
    /// Row per partition of this app.
    PerPartition(AppId),
}

struct RowFold {
    grouping: Grouping,
    tables: HashMap<AppId, AppPartitions>,
    rows: Vec<StatRow>,
}

impl RowFold {
    fn per_app(tables: Vec<(&AppInfo, AppPartitions)>) -> Self {
        let mut row_of = HashMap::with_capacity(tables.len());
        let mut rows = Vec::with_capacity(tables.len());
        let mut by_id = HashMap::with_capacity(tables.len());
        for (app, partitions) in tables {
            row_of.insert(app.app_id, rows.len());
            rows.push(StatRow::new(app.app_name.clone()));
            by_id.insert(app.app_id, partitions);
        }
        Self {
            grouping: Grouping::PerApp(row_of),
            tables: by_id,
            rows,
        }
    }

    fn per_partition(partitions: AppPartitions) -> Self {
        let app_id = partitions.app_id;
        let rows = (0..partitions.partition_count)
            .map(|idx| StatRow::new(idx.to_string()))
            .collect();
        Self {
            grouping: Grouping::PerPartition(app_id),
            tables: HashMap::from([(app_id, partitions)]),
            rows,
        }
    }

    fn add(&mut self, node: &NodeAddress, metric: &PerfCounterMetric) -> Result<(), StatError> {
        let name = MetricWireName::parse(&metric.name).map_err(|source| StatError::MetricName {
            node: node.clone(),
            source,
        })?;
        let counter = name
            .metric
            .parse::<AppCounter>()
            .map_err(|source| StatError::UnknownCounter {
                node: node.clone(),
                source,
            })?;

        let Some(partitions) = self.tables.get(&name.app_id) else {
            return match self.grouping {
                Grouping::PerApp(_) => Ok(()),
                Grouping::PerPartition(expected) => Err(StatError::ForeignApp {
                    node: node.clone(),
                    app_id: name.app_id,
                    expected,
                }),
            };
        };
        let Some(pc) = partitions.get(name.partition_index) else {
            return Err(StatError::PartitionOutOfRange {
                app_id: name.app_id,
                partition_index: name.partition_index,
                partition_count: partitions.partition_count,
            });
        };
        if !pc.is_primary(node) {
            return Ok(());
        }

        let row = match &self.grouping {
            Grouping::PerApp(row_of) => row_of.get(&name.app_id).copied(),
            Grouping::PerPartition(_) => usize::try_from(name.partition_index).ok(),
        };
        if let Some(row) = row.and_then(|idx| self.rows.get_mut(idx)) {
            row.add(counter, metric.value);
        }
        Ok(())
    }
}
