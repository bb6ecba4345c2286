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

//! The replicated unit: one service key's registrations within one data center.

use crate::record::Publisher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version reported for writes the cache refuses to apply.
pub const ERROR_DATUM_VERSION: i64 = -2;

/// Authoritative registration set for one (data center, service key) pair.
///
/// At most one datum exists per pair; register ids are unique within
/// `pub_map`. A datum is created lazily on first accepted publish and
/// removed only by an explicit clean, never because its map became empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Datum {
    pub data_center: String,
    pub data_info_id: String,
    pub version: i64,
    /// register_id -> publisher
    pub pub_map: HashMap<String, Publisher>,
}

impl Datum {
    pub fn new(
        data_center: impl Into<String>,
        data_info_id: impl Into<String>,
        version: i64,
    ) -> Self {
        Self {
            data_center: data_center.into(),
            data_info_id: data_info_id.into(),
            version,
            pub_map: HashMap::new(),
        }
    }

    /// Builder-style insert keyed by the record's own register id.
    pub fn with_publisher(mut self, publisher: Publisher) -> Self {
        self.pub_map
            .insert(publisher.register_id().to_string(), publisher);
        self
    }

    /// A non-empty record set consisting solely of tombstones. Such a datum
    /// can only ever unpublish; it cannot seed a brand-new cache entry.
    pub fn contains_only_tombstones(&self) -> bool {
        !self.pub_map.is_empty() && self.pub_map.values().all(Publisher::is_tombstone)
    }
}

/// Outcome of one registration write against the cache.
///
/// `previous_version` is the datum version before the write, `None` when no
/// datum existed for the key. `changed` tells the caller whether a change
/// notification is warranted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeResult {
    pub previous_version: Option<i64>,
    pub changed: bool,
}

impl MergeResult {
    pub fn new(previous_version: Option<i64>, changed: bool) -> Self {
        Self {
            previous_version,
            changed,
        }
    }

    /// A write the cache refused to apply (tombstone-only publish with
    /// nothing cached to unpublish).
    pub fn rejected() -> Self {
        Self {
            previous_version: Some(ERROR_DATUM_VERSION),
            changed: false,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.previous_version == Some(ERROR_DATUM_VERSION) && !self.changed
    }
}
