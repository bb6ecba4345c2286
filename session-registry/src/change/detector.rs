/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Change detector: polls data-tier versions for keys with active interest.

use crate::cache::{DatumKey, SessionCacheService};
use crate::config::SessionFlags;
use crate::observability::events;
use crate::remoting::retry;
use crate::remoting::{DataNodeService, NodeLocator};
use crate::store::Interests;
use crate::task::{TaskEventBus, TaskPayload};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "change_detector";

/// One session node's change-detection loop. Each tick resolves interested
/// service keys to data nodes, fetches versions one batched call per node,
/// and fires a single "data changed" event per key that advanced in any
/// data center.
pub struct ChangeDetector {
    interests: Arc<Interests>,
    data_node_service: Arc<dyn DataNodeService>,
    node_locator: Arc<dyn NodeLocator>,
    cache_service: Arc<dyn SessionCacheService>,
    task_bus: TaskEventBus,
    flags: Arc<SessionFlags>,
    call_timeout: Duration,
}

impl ChangeDetector {
    pub fn new(
        interests: Arc<Interests>,
        data_node_service: Arc<dyn DataNodeService>,
        node_locator: Arc<dyn NodeLocator>,
        cache_service: Arc<dyn SessionCacheService>,
        task_bus: TaskEventBus,
        flags: Arc<SessionFlags>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            interests,
            data_node_service,
            node_locator,
            cache_service,
            task_bus,
            flags,
            call_timeout,
        }
    }

    /// One detection tick. Failures within one address group abandon that
    /// group until the next tick and never poison the others.
    pub async fn run_once(&self) {
        if !self.flags.begin_data_fetch() {
            debug!(
                event = events::FETCH_TICK_SKIPPED,
                component = COMPONENT,
                "data tier is push-driven, fetch loop idle"
            );
            return;
        }

        let data_info_ids = self.interests.interest_data_info_ids();
        if data_info_ids.is_empty() {
            return;
        }

        let groups = self.group_by_node(data_info_ids);
        let fetches = groups
            .into_iter()
            .map(|(address, ids)| self.fetch_changed_keys(address, ids));

        let mut changed_keys = HashSet::new();
        for keys in join_all(fetches).await {
            changed_keys.extend(keys);
        }

        for data_info_id in changed_keys {
            info!(
                event = events::DATA_CHANGE_FIRED,
                component = COMPONENT,
                data_info_id = %data_info_id,
                "firing data change fetch"
            );
            self.task_bus
                .emit(TaskPayload::DataChangeFetch(data_info_id));
        }
    }

    /// Runs the detector on a fixed cadence until the handle is aborted.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }

    fn group_by_node(&self, data_info_ids: Vec<String>) -> HashMap<String, Vec<String>> {
        let mut groups: HashMap<String, Vec<String>> = HashMap::new();
        for data_info_id in data_info_ids {
            match self.node_locator.resolve_node(&data_info_id) {
                Some(address) => groups.entry(address).or_default().push(data_info_id),
                None => warn!(
                    component = COMPONENT,
                    data_info_id = %data_info_id,
                    "no data node resolved, key skipped this tick"
                ),
            }
        }
        groups
    }

    async fn fetch_changed_keys(
        &self,
        address: String,
        data_info_ids: Vec<String>,
    ) -> HashSet<String> {
        let Some(first_key) = data_info_ids.first().cloned() else {
            return HashSet::new();
        };

        let fetch = |target: String| {
            let data_info_ids = data_info_ids.clone();
            async move {
                self.data_node_service
                    .fetch_data_version(&target, data_info_ids)
                    .await
            }
        };
        // the group shares one resolved node, so re-resolving its first key
        // stands for the whole group on retry
        let versions = retry::with_refreshed_target(
            "fetch_data_version",
            self.call_timeout,
            address.clone(),
            || self.node_locator.refresh_node(&first_key),
            fetch,
        )
        .await;

        let versions = match versions {
            Ok(versions) => versions,
            Err(error) => {
                error!(
                    event = events::FETCH_VERSIONS_FAILED,
                    component = COMPONENT,
                    address = %address,
                    err = %error,
                    "version fetch failed, abandoning this address group until the next tick"
                );
                return HashSet::new();
            }
        };
        if versions.is_empty() {
            warn!(
                event = events::FETCH_VERSIONS_EMPTY,
                component = COMPONENT,
                address = %address,
                "fetch no change data versions info"
            );
            return HashSet::new();
        }

        let mut changed = HashSet::new();
        for (data_center, key_versions) in versions {
            for (data_info_id, version) in key_versions {
                if self
                    .interests
                    .check_interest_version(&data_center, &data_info_id, version)
                {
                    info!(
                        event = events::INTEREST_VERSION_ADVANCED,
                        component = COMPONENT,
                        data_center = %data_center,
                        data_info_id = %data_info_id,
                        version,
                        "fetched version higher than current, will fire data change"
                    );
                    self.cache_service.invalidate(&DatumKey {
                        data_info_id: data_info_id.clone(),
                        data_center: data_center.clone(),
                    });
                    changed.insert(data_info_id);
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::ChangeDetector;
    use crate::cache::{DatumKey, SessionCacheService};
    use crate::config::{SessionConfig, SessionFlags};
    use crate::error::SessionError;
    use crate::model::{Subscriber, SubscriberScope};
    use crate::remoting::{DataNodeService, DataVersions, NodeLocator};
    use crate::store::Interests;
    use crate::task::TaskEventBus;
    use async_trait::async_trait;
    use datum_cache::{Publisher, SourceAddress};
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_millis(200);

    struct MapLocator {
        assignments: HashMap<String, String>,
    }

    impl MapLocator {
        fn new(assignments: &[(&str, &str)]) -> Self {
            Self {
                assignments: assignments
                    .iter()
                    .map(|(key, node)| (key.to_string(), node.to_string()))
                    .collect(),
            }
        }
    }

    impl NodeLocator for MapLocator {
        fn resolve_node(&self, data_info_id: &str) -> Option<String> {
            self.assignments.get(data_info_id).cloned()
        }

        fn refresh_node(&self, data_info_id: &str) -> Option<String> {
            self.resolve_node(data_info_id)
        }
    }

    struct ScriptedDataNode {
        versions_by_target: HashMap<String, DataVersions>,
        failing_targets: HashSet<String>,
        fetch_targets: StdMutex<Vec<String>>,
    }

    impl ScriptedDataNode {
        fn new() -> Self {
            Self {
                versions_by_target: HashMap::new(),
                failing_targets: HashSet::new(),
                fetch_targets: StdMutex::new(Vec::new()),
            }
        }

        fn with_versions(mut self, target: &str, triples: &[(&str, &str, i64)]) -> Self {
            let entry: &mut DataVersions =
                self.versions_by_target.entry(target.to_string()).or_default();
            for (data_center, data_info_id, version) in triples {
                entry
                    .entry(data_center.to_string())
                    .or_default()
                    .insert(data_info_id.to_string(), *version);
            }
            self
        }

        fn with_failing_target(mut self, target: &str) -> Self {
            self.failing_targets.insert(target.to_string());
            self
        }

        fn fetch_count_for(&self, target: &str) -> usize {
            self.fetch_targets
                .lock()
                .expect("lock fetch_targets")
                .iter()
                .filter(|seen| seen.as_str() == target)
                .count()
        }
    }

    #[async_trait]
    impl DataNodeService for ScriptedDataNode {
        async fn register(&self, _publisher: &Publisher) -> Result<(), SessionError> {
            Ok(())
        }

        async fn unregister(&self, _publisher: &Publisher) -> Result<(), SessionError> {
            Ok(())
        }

        async fn fetch_data_version(
            &self,
            target: &str,
            _data_info_ids: Vec<String>,
        ) -> Result<DataVersions, SessionError> {
            self.fetch_targets
                .lock()
                .expect("lock fetch_targets")
                .push(target.to_string());
            if self.failing_targets.contains(target) {
                return Err(SessionError::RemoteCallFailed {
                    operation: "fetch_data_version",
                    detail: "connection refused".to_string(),
                });
            }
            Ok(self
                .versions_by_target
                .get(target)
                .cloned()
                .unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct RecordingCache {
        invalidated: StdMutex<Vec<DatumKey>>,
    }

    impl SessionCacheService for RecordingCache {
        fn invalidate(&self, key: &DatumKey) {
            self.invalidated
                .lock()
                .expect("lock invalidated")
                .push(key.clone());
        }
    }

    fn interested(keys: &[&str]) -> Arc<Interests> {
        let interests = Arc::new(Interests::new());
        for (index, key) in keys.iter().enumerate() {
            interests.add(Subscriber {
                register_id: format!("s{index}"),
                data_info_id: key.to_string(),
                source_address: SourceAddress::new("192.168.1.2", 7000 + index as u16),
                scope: SubscriberScope::Zone,
            });
        }
        interests
    }

    fn armed_flags() -> Arc<SessionFlags> {
        let flags = Arc::new(SessionFlags::new(&SessionConfig::default()));
        flags.set_begin_data_fetch(true);
        flags
    }

    struct Fixture {
        detector: ChangeDetector,
        data_node: Arc<ScriptedDataNode>,
        cache: Arc<RecordingCache>,
        task_events: tokio::sync::mpsc::UnboundedReceiver<crate::task::TaskEvent>,
    }

    fn fixture(
        interests: Arc<Interests>,
        data_node: ScriptedDataNode,
        locator: MapLocator,
        flags: Arc<SessionFlags>,
    ) -> Fixture {
        let data_node = Arc::new(data_node);
        let cache = Arc::new(RecordingCache::default());
        let (task_bus, task_events) = TaskEventBus::new();
        let detector = ChangeDetector::new(
            interests,
            data_node.clone(),
            Arc::new(locator),
            cache.clone(),
            task_bus,
            flags,
            TIMEOUT,
        );
        Fixture {
            detector,
            data_node,
            cache,
            task_events,
        }
    }

    #[tokio::test]
    async fn detector_is_inert_until_begin_data_fetch_is_set() {
        let flags = Arc::new(SessionFlags::new(&SessionConfig::default()));
        let mut fix = fixture(
            interested(&["svc:1.0"]),
            ScriptedDataNode::new().with_versions("10.0.1.1:9620", &[("DC1", "svc:1.0", 2)]),
            MapLocator::new(&[("svc:1.0", "10.0.1.1:9620")]),
            flags,
        );

        fix.detector.run_once().await;

        assert_eq!(fix.data_node.fetch_count_for("10.0.1.1:9620"), 0);
        assert!(fix.task_events.try_recv().is_err());
    }

    #[tokio::test]
    async fn advanced_version_fires_once_and_second_tick_is_silent() {
        let interests = interested(&["svc:1.0"]);
        assert!(interests.check_interest_version("DC1", "svc:1.0", 1));
        let mut fix = fixture(
            interests,
            ScriptedDataNode::new().with_versions("10.0.1.1:9620", &[("DC1", "svc:1.0", 2)]),
            MapLocator::new(&[("svc:1.0", "10.0.1.1:9620")]),
            armed_flags(),
        );

        fix.detector.run_once().await;

        let event = fix.task_events.try_recv().expect("one data change event");
        assert_eq!(event.kind(), "DATA_CHANGE_FETCH_TASK");
        assert!(fix.task_events.try_recv().is_err());
        assert_eq!(
            *fix.cache.invalidated.lock().expect("lock invalidated"),
            vec![DatumKey {
                data_info_id: "svc:1.0".to_string(),
                data_center: "DC1".to_string(),
            }]
        );

        // no version advance on the second tick, nothing may fire
        fix.detector.run_once().await;
        assert!(fix.task_events.try_recv().is_err());
        assert_eq!(
            fix.cache.invalidated.lock().expect("lock invalidated").len(),
            1
        );
    }

    #[tokio::test]
    async fn advances_in_several_centers_dedupe_to_one_event() {
        let mut fix = fixture(
            interested(&["svc:1.0"]),
            ScriptedDataNode::new().with_versions(
                "10.0.1.1:9620",
                &[("DC1", "svc:1.0", 2), ("DC2", "svc:1.0", 3)],
            ),
            MapLocator::new(&[("svc:1.0", "10.0.1.1:9620")]),
            armed_flags(),
        );

        fix.detector.run_once().await;

        assert!(fix.task_events.try_recv().is_ok());
        assert!(fix.task_events.try_recv().is_err());
        assert_eq!(
            fix.cache.invalidated.lock().expect("lock invalidated").len(),
            2
        );
    }

    #[tokio::test]
    async fn a_failing_address_group_does_not_poison_the_others() {
        let mut fix = fixture(
            interested(&["svc:bad", "svc:good"]),
            ScriptedDataNode::new()
                .with_failing_target("10.0.1.1:9620")
                .with_versions("10.0.1.2:9620", &[("DC1", "svc:good", 2)]),
            MapLocator::new(&[
                ("svc:bad", "10.0.1.1:9620"),
                ("svc:good", "10.0.1.2:9620"),
            ]),
            armed_flags(),
        );

        fix.detector.run_once().await;

        let event = fix.task_events.try_recv().expect("surviving group fires");
        match event.payload {
            crate::task::TaskPayload::DataChangeFetch(ref key) => assert_eq!(key, "svc:good"),
            ref other => panic!("unexpected payload: {other:?}"),
        }
        assert!(fix.task_events.try_recv().is_err());
        // the failing group was retried once against the refreshed node
        assert_eq!(fix.data_node.fetch_count_for("10.0.1.1:9620"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_ticks_on_the_configured_cadence() {
        let Fixture {
            detector,
            data_node,
            mut task_events,
            ..
        } = fixture(
            interested(&["svc:1.0"]),
            ScriptedDataNode::new().with_versions("10.0.1.1:9620", &[("DC1", "svc:1.0", 2)]),
            MapLocator::new(&[("svc:1.0", "10.0.1.1:9620")]),
            armed_flags(),
        );

        let handle = Arc::new(detector).spawn(Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(350)).await;
        handle.abort();

        assert!(data_node.fetch_count_for("10.0.1.1:9620") >= 1);
        assert!(task_events.try_recv().is_ok());
    }

    #[tokio::test]
    async fn no_interest_means_no_fetch_calls() {
        let mut fix = fixture(
            Arc::new(Interests::new()),
            ScriptedDataNode::new(),
            MapLocator::new(&[]),
            armed_flags(),
        );

        fix.detector.run_once().await;

        assert!(fix.task_events.try_recv().is_err());
        assert!(fix
            .data_node
            .fetch_targets
            .lock()
            .expect("lock fetch_targets")
            .is_empty());
    }
}
