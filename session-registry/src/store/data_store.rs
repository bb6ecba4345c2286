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

//! Session-side publisher table: what this node forwarded to the data tier.

use crate::store::session_store::{SessionItem, SessionStore};
use datum_cache::Publisher;

impl SessionItem for Publisher {
    fn register_id(&self) -> &str {
        Publisher::register_id(self)
    }

    fn data_info_id(&self) -> &str {
        Publisher::data_info_id(self)
    }

    fn connect_id(&self) -> String {
        self.source_address().address_string()
    }
}

pub struct SessionDataStore {
    store: SessionStore<Publisher>,
}

impl Default for SessionDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionDataStore {
    pub fn new() -> Self {
        Self {
            store: SessionStore::new(),
        }
    }

    pub fn add(&self, publisher: Publisher) {
        self.store.add(publisher);
    }

    pub fn delete_by_id(&self, register_id: &str, data_info_id: &str) -> Option<Publisher> {
        self.store.delete_by_id(register_id, data_info_id)
    }

    pub fn delete_by_connect_id(&self, connect_id: &str) -> Vec<Publisher> {
        self.store.delete_by_connect_id(connect_id)
    }

    pub fn get_publishers(&self, data_info_id: &str) -> Vec<Publisher> {
        self.store.get(data_info_id)
    }

    pub fn get_by_connect_id(&self, connect_id: &str) -> Vec<Publisher> {
        self.store.get_by_connect_id(connect_id)
    }

    pub fn data_info_ids(&self) -> Vec<String> {
        self.store.non_empty_keys()
    }
}
