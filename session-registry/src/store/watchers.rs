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

//! Watcher table.

use crate::model::Watcher;
use crate::store::session_store::{SessionItem, SessionStore};

impl SessionItem for Watcher {
    fn register_id(&self) -> &str {
        &self.register_id
    }

    fn data_info_id(&self) -> &str {
        &self.data_info_id
    }

    fn connect_id(&self) -> String {
        Watcher::connect_id(self)
    }
}

pub struct Watchers {
    store: SessionStore<Watcher>,
}

impl Default for Watchers {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchers {
    pub fn new() -> Self {
        Self {
            store: SessionStore::new(),
        }
    }

    pub fn add(&self, watcher: Watcher) {
        self.store.add(watcher);
    }

    pub fn delete_by_id(&self, register_id: &str, data_info_id: &str) -> bool {
        self.store.delete_by_id(register_id, data_info_id).is_some()
    }

    pub fn delete_by_connect_id(&self, connect_id: &str) -> Vec<Watcher> {
        self.store.delete_by_connect_id(connect_id)
    }

    pub fn get_watchers(&self, data_info_id: &str) -> Vec<Watcher> {
        self.store.get(data_info_id)
    }

    pub fn get_by_connect_id(&self, connect_id: &str) -> Vec<Watcher> {
        self.store.get_by_connect_id(connect_id)
    }
}
