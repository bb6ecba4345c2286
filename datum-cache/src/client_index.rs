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

//! Reverse client index: every registration owned by one client address.

use crate::record::Publisher;
use dashmap::DashMap;
use std::collections::HashMap;

/// Derived view mapping a client `host:port` string to the live records it
/// currently owns across all datums. Maintained by the store's merge paths;
/// an (address, register_id) pair exists here iff a live datum record with
/// that identity and address exists.
#[derive(Default)]
pub(crate) struct ClientIndex {
    /// client address -> register_id -> publisher
    entries: DashMap<String, DashMap<String, Publisher>>,
}

impl ClientIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, publisher: Publisher) {
        let address = publisher.source_address().address_string();
        self.entries
            .entry(address)
            .or_default()
            .insert(publisher.register_id().to_string(), publisher);
    }

    /// Removing an unknown address or id is a no-op; the per-address map is
    /// kept once created, mirroring how entries are looked up by address.
    pub(crate) fn remove(&self, address: &str, register_id: &str) {
        if let Some(per_client) = self.entries.get(address) {
            per_client.remove(register_id);
        }
    }

    pub(crate) fn snapshot(&self, address: &str) -> Option<HashMap<String, Publisher>> {
        self.entries.get(address).map(|per_client| {
            per_client
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect()
        })
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, address: &str, register_id: &str) -> bool {
        self.entries
            .get(address)
            .map(|per_client| per_client.contains_key(register_id))
            .unwrap_or(false)
    }
}
