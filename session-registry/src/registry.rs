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

//! Session registry: registration lifecycle orchestration for one node.

use crate::cache::SessionCacheService;
use crate::change::ChangeDetector;
use crate::config::{SessionConfig, SessionFlags};
use crate::error::SessionError;
use crate::model::{StoreData, Subscriber, Watcher};
use crate::observability::events;
use crate::remoting::retry;
use crate::remoting::{ConnectionRegistry, DataNodeService, MetaLeaderService, NodeLocator};
use crate::store::{Interests, SessionDataStore, Watchers};
use crate::task::{TaskEvent, TaskEventBus, TaskPayload};
use datum_cache::Publisher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "session_registry";

/// Entry point of the session tier: validates that a registration's client
/// connection is alive, records it locally, forwards publisher data to the
/// data tier, and fires the asynchronous follow-up work.
pub struct SessionRegistry {
    session_interests: Arc<Interests>,
    session_watchers: Arc<Watchers>,
    session_data_store: Arc<SessionDataStore>,
    data_node_service: Arc<dyn DataNodeService>,
    meta_leader_service: Arc<dyn MetaLeaderService>,
    connection_registry: Arc<dyn ConnectionRegistry>,
    task_bus: TaskEventBus,
    flags: Arc<SessionFlags>,
    change_detector: Arc<ChangeDetector>,
    fetch_interval: Duration,
    call_timeout: Duration,
}

impl SessionRegistry {
    /// Wires the registry and hands back the task-event receiver for the
    /// surrounding system's worker pool.
    pub fn new(
        config: &SessionConfig,
        data_node_service: Arc<dyn DataNodeService>,
        node_locator: Arc<dyn NodeLocator>,
        meta_leader_service: Arc<dyn MetaLeaderService>,
        connection_registry: Arc<dyn ConnectionRegistry>,
        cache_service: Arc<dyn SessionCacheService>,
    ) -> (Self, UnboundedReceiver<TaskEvent>) {
        let (task_bus, task_events) = TaskEventBus::new();
        let flags = Arc::new(SessionFlags::new(config));
        let session_interests = Arc::new(Interests::new());
        let call_timeout = Duration::from_millis(config.remote_call_timeout_millis);
        let change_detector = Arc::new(ChangeDetector::new(
            session_interests.clone(),
            data_node_service.clone(),
            node_locator,
            cache_service,
            task_bus.clone(),
            flags.clone(),
            call_timeout,
        ));
        info!(
            component = COMPONENT,
            region = %config.session_server_region,
            data_server_port = config.data_server_port,
            "session registry created"
        );

        let registry = Self {
            session_interests,
            session_watchers: Arc::new(Watchers::new()),
            session_data_store: Arc::new(SessionDataStore::new()),
            data_node_service,
            meta_leader_service,
            connection_registry,
            task_bus,
            flags,
            change_detector,
            fetch_interval: Duration::from_millis(config.fetch_interval_millis),
            call_timeout,
        };
        (registry, task_events)
    }

    pub async fn register(&self, store_data: StoreData) -> Result<(), SessionError> {
        self.check_connect(&store_data)?;

        match store_data {
            StoreData::Publisher(publisher) => {
                retry::with_refreshed_leader(
                    "publisher_register",
                    self.call_timeout,
                    self.meta_leader_service.as_ref(),
                    || self.data_node_service.register(&publisher),
                )
                .await?;
                self.session_data_store.add(publisher.clone());
                self.after_publisher_register(publisher);
            }
            StoreData::Subscriber(subscriber) => {
                self.session_interests.add(subscriber.clone());
                self.after_subscriber_register(subscriber);
            }
            StoreData::Watcher(watcher) => {
                self.session_watchers.add(watcher.clone());
                self.after_watcher_register(watcher);
            }
        }
        Ok(())
    }

    pub async fn unregister(&self, store_data: StoreData) -> Result<(), SessionError> {
        debug!(
            component = COMPONENT,
            register_id = %store_data.register_id(),
            data_info_id = %store_data.data_info_id(),
            "unregister"
        );
        match store_data {
            StoreData::Publisher(publisher) => {
                self.session_data_store
                    .delete_by_id(publisher.register_id(), publisher.data_info_id());
                retry::with_refreshed_leader(
                    "publisher_unregister",
                    self.call_timeout,
                    self.meta_leader_service.as_ref(),
                    || self.data_node_service.unregister(&publisher),
                )
                .await?;
            }
            StoreData::Subscriber(subscriber) => {
                self.session_interests
                    .delete_by_id(&subscriber.register_id, &subscriber.data_info_id);
            }
            StoreData::Watcher(watcher) => {
                self.session_watchers
                    .delete_by_id(&watcher.register_id, &watcher.data_info_id);
            }
        }
        Ok(())
    }

    /// Bulk cancellation by connection id. Only enqueues the cancellation
    /// task; actual cleanup happens downstream via [`clean_connects`].
    ///
    /// [`clean_connects`]: Self::clean_connects
    pub fn cancel(&self, connect_ids: Vec<String>) {
        info!(
            event = events::CANCEL_ENQUEUED,
            component = COMPONENT,
            connections = connect_ids.len(),
            "send cancel data task event"
        );
        self.task_bus.emit(TaskPayload::CancelConnections(connect_ids));
    }

    /// Downstream half of [`cancel`]: drops everything the listed
    /// connections registered on this node and forwards an unregister to the
    /// data tier for each dropped publisher. Best-effort; remote failures
    /// are logged and do not stop the sweep.
    ///
    /// [`cancel`]: Self::cancel
    pub async fn clean_connects(&self, connect_ids: &[String]) {
        for connect_id in connect_ids {
            self.session_interests.delete_by_connect_id(connect_id);
            self.session_watchers.delete_by_connect_id(connect_id);
            for publisher in self.session_data_store.delete_by_connect_id(connect_id) {
                let result = retry::with_refreshed_leader(
                    "publisher_unregister",
                    self.call_timeout,
                    self.meta_leader_service.as_ref(),
                    || self.data_node_service.unregister(&publisher),
                )
                .await;
                if let Err(err) = result {
                    warn!(
                        component = COMPONENT,
                        connect_id = %connect_id,
                        register_id = %publisher.register_id(),
                        err = %err,
                        "unregister for cancelled connection failed"
                    );
                }
            }
        }
    }

    /// One change-detection tick; see [`ChangeDetector::run_once`].
    pub async fn fetch_change_data(&self) {
        self.change_detector.run_once().await;
    }

    /// Starts the periodic fetch loop at the configured cadence.
    pub fn spawn_fetch_loop(&self) -> JoinHandle<()> {
        self.change_detector.clone().spawn(self.fetch_interval)
    }

    pub fn interests(&self) -> &Arc<Interests> {
        &self.session_interests
    }

    pub fn watchers(&self) -> &Arc<Watchers> {
        &self.session_watchers
    }

    pub fn data_store(&self) -> &Arc<SessionDataStore> {
        &self.session_data_store
    }

    pub fn flags(&self) -> &Arc<SessionFlags> {
        &self.flags
    }

    fn check_connect(&self, store_data: &StoreData) -> Result<(), SessionError> {
        let address = store_data.source_address().address_string();
        if self.connection_registry.is_channel_open(&address) {
            return Ok(());
        }
        error!(
            event = events::REGISTER_REJECTED_NO_CHANNEL,
            component = COMPONENT,
            address = %address,
            register_id = %store_data.register_id(),
            "register address has not connected this session server"
        );
        Err(SessionError::ConnectionNotFound { address })
    }

    fn after_publisher_register(&self, publisher: Publisher) {
        // cross-node sync of the accepted registration happens downstream
        self.task_bus.emit(TaskPayload::SyncPublisher(publisher));
    }

    fn after_subscriber_register(&self, subscriber: Subscriber) {
        if self.flags.stop_push() {
            debug!(
                component = COMPONENT,
                register_id = %subscriber.register_id,
                "push stopped, subscriber fetch task not fired"
            );
            return;
        }
        self.task_bus
            .emit(TaskPayload::SubscriberRegisterFetch(subscriber));
    }

    fn after_watcher_register(&self, watcher: Watcher) {
        self.task_bus.emit(TaskPayload::WatcherRegisterFetch(watcher));
    }
}
