#[cfg(test)]
mod tests {
    use crate::{
        dispatcher,
        utils::{
            MockChannel, MockMeta, NodeBehavior, app, assignment, perf_reply, raw_perf_reply,
        },
    };
    use engine_core::error::TransportError;
    use engine_processing::{error::StatError, stat::StatAggregator};
    use model::{
        core::identifiers::NodeAddress,
        stats::metric_name::{all_apps_filter, app_filter},
    };
    use std::{collections::HashMap, sync::Arc};
    use tracing_test::traced_test;

    const N1: &str = "n1:34801";
    const N2: &str = "n2:34801";
    const N3: &str = "n3:34801";

    /// App `temp` (id 1) with partition `i` primary on node `i + 1`.
    fn one_app_cluster() -> MockMeta {
        MockMeta {
            replicas: [N1, N2, N3].iter().map(|n| NodeAddress::from(*n)).collect(),
            apps: vec![app(1, "temp", 3)],
            partitions: HashMap::from([("temp".to_string(), assignment(1, &[N1, N2, N3]))]),
            ..Default::default()
        }
    }

    /// Every node serves all three partitions; only the primary's value is real.
    fn replying_channel() -> MockChannel {
        let reply = |primary_of: i32| {
            let counters: Vec<_> = (0..3)
                .map(|p| (1, p, "get_qps", if p == primary_of { 5.0 } else { 1000.0 }))
                .collect();
            NodeBehavior::Reply(perf_reply(&counters))
        };
        MockChannel::new()
            .on(N1, reply(0))
            .on(N2, reply(1))
            .on(N3, reply(2))
    }

    fn aggregator(meta: MockMeta, channel: Arc<MockChannel>) -> StatAggregator {
        StatAggregator::new(dispatcher(Arc::new(meta), channel))
    }

    #[traced_test]
    #[tokio::test]
    async fn sums_primary_values_per_app() {
        let channel = Arc::new(replying_channel());
        let rows = aggregator(one_app_cluster(), channel.clone())
            .app_stat(None)
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_name, "temp");
        assert_eq!(rows[0].get_qps, 15.0);
        assert_eq!(rows[0].put_qps, 0.0);

        let calls = channel.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].1.name, "perf-counters");
        assert_eq!(calls[0].1.arguments, vec![all_apps_filter()]);
        assert!(logs_contain("Collected app stats"));
    }

    #[tokio::test]
    async fn single_app_yields_partition_rows() {
        let channel = Arc::new(replying_channel());
        let rows = aggregator(one_app_cluster(), channel.clone())
            .app_stat(Some("temp"))
            .await
            .unwrap();

        let names: Vec<_> = rows.iter().map(|r| r.row_name.as_str()).collect();
        assert_eq!(names, vec!["0", "1", "2"]);
        assert!(rows.iter().all(|r| r.get_qps == 5.0));
        assert_eq!(channel.calls()[0].1.arguments, vec![app_filter(1)]);
    }

    #[traced_test]
    #[tokio::test]
    async fn non_ok_reply_aborts() {
        let channel = MockChannel::new()
            .on(N1, NodeBehavior::Reply(perf_reply(&[(1, 0, "get_qps", 5.0)])))
            .on(N2, NodeBehavior::Reply(r#"{"result":"ERR_BUSY","counters":[]}"#.into()))
            .on(N3, NodeBehavior::Reply(perf_reply(&[(1, 2, "get_qps", 5.0)])));

        let err = aggregator(one_app_cluster(), Arc::new(channel))
            .app_stat(None)
            .await
            .unwrap_err();

        match err {
            StatError::NodeResult { node, result } => {
                assert_eq!(node, NodeAddress::from(N2));
                assert_eq!(result, "ERR_BUSY");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(logs_contain("Collecting app stats failed"));
    }

    #[tokio::test]
    async fn unreachable_or_silent_node_aborts() {
        let failing = MockChannel::new()
            .on(N1, NodeBehavior::Fail(TransportError::Unreachable(N1.into())))
            .on(N2, NodeBehavior::Reply(perf_reply(&[])))
            .on(N3, NodeBehavior::Reply(perf_reply(&[])));
        let err = aggregator(one_app_cluster(), Arc::new(failing))
            .app_stat(None)
            .await
            .unwrap_err();
        assert!(matches!(err, StatError::NodeQuery { .. }));

        let hanging = MockChannel::new()
            .on(N1, NodeBehavior::Reply(perf_reply(&[])))
            .on(N2, NodeBehavior::Reply(perf_reply(&[])))
            .on(N3, NodeBehavior::Hang);
        let err = aggregator(one_app_cluster(), Arc::new(hanging))
            .app_stat(None)
            .await
            .unwrap_err();
        match err {
            StatError::NodeQuery { node, reason } => {
                assert_eq!(node, NodeAddress::from(N3));
                assert!(reason.contains("timed out"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn undecodable_reply_aborts() {
        let channel = MockChannel::new()
            .on(N1, NodeBehavior::Reply("unknown command".into()))
            .on(N2, NodeBehavior::Reply(perf_reply(&[])))
            .on(N3, NodeBehavior::Reply(perf_reply(&[])));
        let err = aggregator(one_app_cluster(), Arc::new(channel))
            .app_stat(None)
            .await
            .unwrap_err();
        assert!(matches!(err, StatError::Decode { .. }));
    }

    #[tokio::test]
    async fn rows_follow_app_listing_order() {
        let meta = MockMeta {
            replicas: vec![NodeAddress::from(N1)],
            apps: vec![app(7, "zeta", 1), app(3, "alpha", 2)],
            partitions: HashMap::from([
                ("zeta".to_string(), assignment(7, &[N1])),
                ("alpha".to_string(), assignment(3, &[N1, N1])),
            ]),
            ..Default::default()
        };
        let channel = MockChannel::new().on(
            N1,
            NodeBehavior::Reply(perf_reply(&[
                (3, 0, "put_qps", 1.5),
                (3, 1, "put_qps", 2.5),
                (7, 0, "disk.storage.sst(MB)", 64.0),
                (42, 0, "get_qps", 9.0),
            ])),
        );

        let rows = aggregator(meta, Arc::new(channel)).app_stat(None).await.unwrap();

        assert_eq!(rows[0].row_name, "zeta");
        assert_eq!(rows[0].storage_mb, 64.0);
        assert_eq!(rows[1].row_name, "alpha");
        assert_eq!(rows[1].put_qps, 4.0);
        assert_eq!(rows[0].get_qps + rows[1].get_qps, 0.0);
    }

    #[tokio::test]
    async fn foreign_app_in_single_app_mode_is_rejected() {
        let channel = MockChannel::new()
            .on(N1, NodeBehavior::Reply(perf_reply(&[(2, 0, "get_qps", 1.0)])))
            .on(N2, NodeBehavior::Reply(perf_reply(&[])))
            .on(N3, NodeBehavior::Reply(perf_reply(&[])));
        let err = aggregator(one_app_cluster(), Arc::new(channel))
            .app_stat(Some("temp"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StatError::ForeignApp {
                app_id: 2,
                expected: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unknown_counter_from_secondary_is_rejected() {
        // n2 is not primary of partition 0, yet the unknown id still fails the run.
        let channel = MockChannel::new()
            .on(N1, NodeBehavior::Reply(perf_reply(&[])))
            .on(N2, NodeBehavior::Reply(perf_reply(&[(1, 0, "bogus_qps", 1.0)])))
            .on(N3, NodeBehavior::Reply(perf_reply(&[])));
        let err = aggregator(one_app_cluster(), Arc::new(channel))
            .app_stat(None)
            .await
            .unwrap_err();
        assert!(matches!(err, StatError::UnknownCounter { .. }));
    }

    #[tokio::test]
    async fn malformed_name_and_bad_partition_are_rejected() {
        let malformed = MockChannel::new()
            .on(N1, NodeBehavior::Reply(raw_perf_reply(&[("replica*app.pegasus*get_qps", 1.0)])))
            .on(N2, NodeBehavior::Reply(perf_reply(&[])))
            .on(N3, NodeBehavior::Reply(perf_reply(&[])));
        let err = aggregator(one_app_cluster(), Arc::new(malformed))
            .app_stat(None)
            .await
            .unwrap_err();
        assert!(matches!(err, StatError::MetricName { .. }));

        let out_of_range = MockChannel::new()
            .on(N1, NodeBehavior::Reply(perf_reply(&[(1, 3, "get_qps", 1.0)])))
            .on(N2, NodeBehavior::Reply(perf_reply(&[])))
            .on(N3, NodeBehavior::Reply(perf_reply(&[])));
        let err = aggregator(one_app_cluster(), Arc::new(out_of_range))
            .app_stat(Some("temp"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StatError::PartitionOutOfRange {
                partition_index: 3,
                partition_count: 3,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn missing_app_and_inconsistent_assignment() {
        let err = aggregator(one_app_cluster(), Arc::new(replying_channel()))
            .app_stat(Some("absent"))
            .await
            .unwrap_err();
        assert!(matches!(err, StatError::AppNotFound(name) if name == "absent"));

        let mut meta = one_app_cluster();
        meta.partitions
            .insert("temp".to_string(), assignment(1, &[N1, N2]));
        let channel = Arc::new(replying_channel());
        let err = aggregator(meta, channel.clone())
            .app_stat(None)
            .await
            .unwrap_err();
        assert!(matches!(err, StatError::AssignmentMismatch { .. }));
        assert!(channel.calls().is_empty());
    }
}
