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

//! Shared keyed store primitive behind the session-side tables.

use dashmap::DashMap;
use std::collections::{HashMap, HashSet};

/// Anything a session node tracks per (service key, register id) that also
/// belongs to one client connection.
pub(crate) trait SessionItem: Clone {
    fn register_id(&self) -> &str;
    fn data_info_id(&self) -> &str;
    fn connect_id(&self) -> String;
}

/// data_info_id -> register_id -> item, with a connect-id secondary view.
/// The two views are updated as separate steps; membership queries between
/// the steps of one mutation may see one view ahead of the other.
pub(crate) struct SessionStore<T> {
    by_key: DashMap<String, HashMap<String, T>>,
    /// connect id -> (data_info_id, register_id) memberships
    by_connect: DashMap<String, HashSet<(String, String)>>,
}

impl<T: SessionItem> SessionStore<T> {
    pub(crate) fn new() -> Self {
        Self {
            by_key: DashMap::new(),
            by_connect: DashMap::new(),
        }
    }

    pub(crate) fn add(&self, item: T) {
        let data_info_id = item.data_info_id().to_string();
        let register_id = item.register_id().to_string();
        let connect_id = item.connect_id();
        let replaced = self
            .by_key
            .entry(data_info_id.clone())
            .or_default()
            .insert(register_id.clone(), item);
        // a re-register through a new connection moves ownership
        if let Some(previous) = replaced {
            let previous_connect = previous.connect_id();
            if previous_connect != connect_id {
                if let Some(mut members) = self.by_connect.get_mut(&previous_connect) {
                    members.remove(&(data_info_id.clone(), register_id.clone()));
                }
            }
        }
        self.by_connect
            .entry(connect_id)
            .or_default()
            .insert((data_info_id, register_id));
    }

    pub(crate) fn delete_by_id(&self, register_id: &str, data_info_id: &str) -> Option<T> {
        let removed = self
            .by_key
            .get_mut(data_info_id)
            .and_then(|mut items| items.remove(register_id));
        if let Some(item) = &removed {
            if let Some(mut members) = self.by_connect.get_mut(&item.connect_id()) {
                members.remove(&(data_info_id.to_string(), register_id.to_string()));
            }
        }
        removed
    }

    pub(crate) fn delete_by_connect_id(&self, connect_id: &str) -> Vec<T> {
        let Some((_, members)) = self.by_connect.remove(connect_id) else {
            return Vec::new();
        };
        let mut removed = Vec::new();
        for (data_info_id, register_id) in members {
            if let Some(item) = self
                .by_key
                .get_mut(&data_info_id)
                .and_then(|mut items| items.remove(&register_id))
            {
                removed.push(item);
            }
        }
        removed
    }

    pub(crate) fn get(&self, data_info_id: &str) -> Vec<T> {
        self.by_key
            .get(data_info_id)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn get_by_connect_id(&self, connect_id: &str) -> Vec<T> {
        let Some(members) = self.by_connect.get(connect_id) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|(data_info_id, register_id)| {
                self.by_key
                    .get(data_info_id)
                    .and_then(|items| items.get(register_id).cloned())
            })
            .collect()
    }

    pub(crate) fn is_empty_key(&self, data_info_id: &str) -> bool {
        self.by_key
            .get(data_info_id)
            .map(|items| items.is_empty())
            .unwrap_or(true)
    }

    /// Keys that still have at least one item registered.
    pub(crate) fn non_empty_keys(&self) -> Vec<String> {
        self.by_key
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }
}
