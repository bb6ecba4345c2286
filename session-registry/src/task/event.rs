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

//! Task events fired into the asynchronous dispatch substrate.

use crate::model::{Subscriber, Watcher};
use datum_cache::Publisher;
use uuid::Uuid;

/// Downstream work a session node wants performed asynchronously.
#[derive(Clone, Debug)]
pub enum TaskPayload {
    /// Sync a freshly accepted publisher registration across nodes.
    SyncPublisher(Publisher),
    /// Fetch current data for a new subscriber and push it.
    SubscriberRegisterFetch(Subscriber),
    /// Fetch current data for a new watcher and push it.
    WatcherRegisterFetch(Watcher),
    /// Tear down everything the listed client connections registered.
    CancelConnections(Vec<String>),
    /// Data for this service key changed; re-fetch and push to interested
    /// subscribers.
    DataChangeFetch(String),
}

#[derive(Clone, Debug)]
pub struct TaskEvent {
    pub task_id: Uuid,
    pub payload: TaskPayload,
}

impl TaskEvent {
    pub fn new(payload: TaskPayload) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            payload,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.payload {
            TaskPayload::SyncPublisher(_) => "SYNC_PUBLISHER_TASK",
            TaskPayload::SubscriberRegisterFetch(_) => "SUBSCRIBER_REGISTER_FETCH_TASK",
            TaskPayload::WatcherRegisterFetch(_) => "WATCHER_REGISTER_FETCH_TASK",
            TaskPayload::CancelConnections(_) => "CANCEL_DATA_TASK",
            TaskPayload::DataChangeFetch(_) => "DATA_CHANGE_FETCH_TASK",
        }
    }
}
