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

//! Data-node location for routing version-fetch calls.

use arc_swap::ArcSwap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Maps a service key to the data node responsible for it.
pub trait NodeLocator: Send + Sync {
    fn resolve_node(&self, data_info_id: &str) -> Option<String>;

    /// Re-resolves after a failed call; backs the single-retry policy.
    fn refresh_node(&self, data_info_id: &str) -> Option<String>;
}

/// Locator over a node list the bootstrap keeps current (the meta tier
/// pushes node-change notifications; callers swap the list in wholesale).
/// Keys are sharded onto nodes by hash.
pub struct StaticNodeLocator {
    nodes: ArcSwap<Vec<String>>,
}

impl StaticNodeLocator {
    pub fn new(nodes: Vec<String>) -> Self {
        Self {
            nodes: ArcSwap::from_pointee(nodes),
        }
    }

    pub fn update_nodes(&self, nodes: Vec<String>) {
        self.nodes.store(Arc::new(nodes));
    }
}

impl NodeLocator for StaticNodeLocator {
    fn resolve_node(&self, data_info_id: &str) -> Option<String> {
        let nodes = self.nodes.load();
        if nodes.is_empty() {
            return None;
        }
        let mut hasher = DefaultHasher::new();
        data_info_id.hash(&mut hasher);
        let slot = (hasher.finish() % nodes.len() as u64) as usize;
        nodes.get(slot).cloned()
    }

    fn refresh_node(&self, data_info_id: &str) -> Option<String> {
        self.resolve_node(data_info_id)
    }
}
