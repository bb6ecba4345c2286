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

//! End-to-end session-tier flow: subscribe, detect a data-tier version
//! advance, push a change event, cancel the connection.

use async_trait::async_trait;
use datum_cache::{Publisher, SourceAddress};
use session_registry::{
    ConnectionRegistry, DataNodeService, DataVersions, DatumKey, MetaLeaderService, NodeLocator,
    SessionCacheService, SessionConfig, SessionError, SessionRegistry, StoreData, Subscriber,
    SubscriberScope, TaskPayload,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

struct OneNodeLocator;

impl NodeLocator for OneNodeLocator {
    fn resolve_node(&self, _data_info_id: &str) -> Option<String> {
        Some("10.0.1.1:9620".to_string())
    }

    fn refresh_node(&self, data_info_id: &str) -> Option<String> {
        self.resolve_node(data_info_id)
    }
}

struct FixedLeader;

impl MetaLeaderService for FixedLeader {
    fn leader(&self) -> String {
        "10.0.2.1:9615".to_string()
    }

    fn refresh_leader(&self) -> String {
        self.leader()
    }
}

struct AlwaysOpen;

impl ConnectionRegistry for AlwaysOpen {
    fn is_channel_open(&self, _address: &str) -> bool {
        true
    }
}

#[derive(Default)]
struct CountingCache {
    invalidations: Mutex<Vec<DatumKey>>,
}

impl SessionCacheService for CountingCache {
    fn invalidate(&self, key: &DatumKey) {
        self.invalidations
            .lock()
            .expect("lock invalidations")
            .push(key.clone());
    }
}

/// Serves the same version map on every fetch and counts the calls.
struct FixedVersionDataNode {
    versions: DataVersions,
    fetches: Mutex<usize>,
}

impl FixedVersionDataNode {
    fn new(data_center: &str, data_info_id: &str, version: i64) -> Self {
        let mut versions = DataVersions::new();
        versions.insert(
            data_center.to_string(),
            HashMap::from([(data_info_id.to_string(), version)]),
        );
        Self {
            versions,
            fetches: Mutex::new(0),
        }
    }
}

#[async_trait]
impl DataNodeService for FixedVersionDataNode {
    async fn register(&self, _publisher: &Publisher) -> Result<(), SessionError> {
        Ok(())
    }

    async fn unregister(&self, _publisher: &Publisher) -> Result<(), SessionError> {
        Ok(())
    }

    async fn fetch_data_version(
        &self,
        _target: &str,
        _data_info_ids: Vec<String>,
    ) -> Result<DataVersions, SessionError> {
        *self.fetches.lock().expect("lock fetches") += 1;
        Ok(self.versions.clone())
    }
}

#[tokio::test]
async fn subscribe_detect_change_and_cancel() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let data_node = Arc::new(FixedVersionDataNode::new("DC1", "svc:1.0", 2));
    let cache = Arc::new(CountingCache::default());
    let (registry, mut task_events) = SessionRegistry::new(
        &SessionConfig::default(),
        data_node.clone(),
        Arc::new(OneNodeLocator),
        Arc::new(FixedLeader),
        Arc::new(AlwaysOpen),
        cache.clone(),
    );

    registry
        .register(StoreData::Subscriber(Subscriber {
            register_id: "s1".to_string(),
            data_info_id: "svc:1.0".to_string(),
            source_address: SourceAddress::new("10.0.0.1", 100),
            scope: SubscriberScope::Zone,
        }))
        .await
        .expect("subscriber registers");
    assert_eq!(
        task_events.recv().await.expect("fetch event").kind(),
        "SUBSCRIBER_REGISTER_FETCH_TASK"
    );

    // the loop is inert until the meta tier arms it
    registry.fetch_change_data().await;
    assert_eq!(*data_node.fetches.lock().expect("lock fetches"), 0);
    registry.flags().set_begin_data_fetch(true);

    // version 2 is news: one invalidation, one change event
    registry.fetch_change_data().await;
    let event = task_events.try_recv().expect("change event");
    match event.payload {
        TaskPayload::DataChangeFetch(ref data_info_id) => assert_eq!(data_info_id, "svc:1.0"),
        ref other => panic!("unexpected payload: {other:?}"),
    }
    assert_eq!(
        *cache.invalidations.lock().expect("lock invalidations"),
        vec![DatumKey {
            data_info_id: "svc:1.0".to_string(),
            data_center: "DC1".to_string(),
        }]
    );

    // an identical poll is not news
    registry.fetch_change_data().await;
    assert!(task_events.try_recv().is_err());
    assert_eq!(
        cache
            .invalidations
            .lock()
            .expect("lock invalidations")
            .len(),
        1
    );

    // cancelling the connection enqueues, downstream cleanup drains interest
    registry.cancel(vec!["10.0.0.1:100".to_string()]);
    match task_events.try_recv().expect("cancel event").payload {
        TaskPayload::CancelConnections(ref connect_ids) => {
            assert_eq!(connect_ids.len(), 1);
        }
        ref other => panic!("unexpected payload: {other:?}"),
    }
    registry.clean_connects(&["10.0.0.1:100".to_string()]).await;
    assert!(registry.interests().get_interests("svc:1.0").is_empty());

    // with no interest left, the loop stops polling entirely
    let polls_before = *data_node.fetches.lock().expect("lock fetches");
    registry.fetch_change_data().await;
    assert_eq!(*data_node.fetches.lock().expect("lock fetches"), polls_before);
}
