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

//! Datum store: the authoritative per data-center registration cache.

use crate::client_index::ClientIndex;
use crate::datum::{Datum, MergeResult};
use crate::merge::{cover_datum, merge_datum, PutMode};
use crate::record::Publisher;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;

const COMPONENT: &str = "datum_cache";

/// Cache of datums, providing query functions to the upper modules and the
/// merge entry point for the replication write path.
///
/// The datum map and the reverse client index are independent concurrent
/// structures; a write updates them as two separate steps with no joint
/// lock, so a reader of one can observe the other mid-merge. Writers for
/// the same (data center, service key) pair are serialized by the map's
/// entry guard, so a datum itself is never seen half-merged.
#[derive(Default)]
pub struct DatumCache {
    /// data_center -> data_info_id -> datum
    datum_map: DashMap<String, DashMap<String, Datum>>,
    client_index: ClientIndex,
}

impl DatumCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, data_center: &str, data_info_id: &str) -> Option<Datum> {
        self.datum_map.get(data_center).and_then(|per_center| {
            per_center
                .get(data_info_id)
                .map(|datum| datum.value().clone())
        })
    }

    /// All data centers currently holding a datum for this key.
    pub fn get_by_data_info_id(&self, data_info_id: &str) -> HashMap<String, Datum> {
        self.datum_map
            .iter()
            .filter_map(|per_center| {
                per_center
                    .value()
                    .get(data_info_id)
                    .map(|datum| (per_center.key().clone(), datum.value().clone()))
            })
            .collect()
    }

    /// Group query: one center when given, otherwise every center holding
    /// the key.
    pub fn get_datum_group(
        &self,
        data_center: Option<&str>,
        data_info_id: &str,
    ) -> HashMap<String, Datum> {
        match data_center {
            Some(center) => self
                .get(center, data_info_id)
                .map(|datum| HashMap::from([(center.to_string(), datum)]))
                .unwrap_or_default(),
            None => self.get_by_data_info_id(data_info_id),
        }
    }

    pub fn get_all(&self) -> HashMap<String, HashMap<String, Datum>> {
        self.datum_map
            .iter()
            .map(|per_center| {
                let datums = per_center
                    .value()
                    .iter()
                    .map(|datum| (datum.key().clone(), datum.value().clone()))
                    .collect();
                (per_center.key().clone(), datums)
            })
            .collect()
    }

    /// Every registration currently owned by one client connection, used to
    /// tear a disconnected client's registrations down.
    pub fn get_by_client_address(&self, address: &str) -> Option<HashMap<String, Publisher>> {
        self.client_index.snapshot(address)
    }

    pub fn put_datum(&self, mode: PutMode, datum: Datum) -> MergeResult {
        let per_center = self
            .datum_map
            .entry(datum.data_center.clone())
            .or_default()
            .downgrade();

        // a tombstone-only datum cannot unpublish what was never cached
        if datum.contains_only_tombstones() && per_center.get(&datum.data_info_id).is_none() {
            debug!(
                component = COMPONENT,
                data_info_id = %datum.data_info_id,
                data_center = %datum.data_center,
                "rejecting first-ever tombstone-only publish"
            );
            return MergeResult::rejected();
        }

        let result = match per_center.entry(datum.data_info_id.clone()) {
            Entry::Vacant(slot) => {
                let mut datum = datum;
                // a tombstone can never be the first record of a new datum
                datum.pub_map.retain(|_, publisher| !publisher.is_tombstone());
                let installed = slot.insert(datum);
                for publisher in installed.pub_map.values() {
                    self.client_index.insert(publisher.clone());
                }
                MergeResult::new(None, true)
            }
            Entry::Occupied(mut slot) => match mode {
                PutMode::Merge => merge_datum(slot.get_mut(), datum, &self.client_index),
                PutMode::Cover => {
                    let previous_version = cover_datum(slot.get_mut(), datum, &self.client_index);
                    MergeResult::new(Some(previous_version), true)
                }
            },
        };
        result
    }

    /// Removes the datum and every reverse-index entry it owns. Returns
    /// whether anything was removed.
    pub fn clean_datum(&self, data_center: &str, data_info_id: &str) -> bool {
        let removed = self
            .datum_map
            .get(data_center)
            .and_then(|per_center| per_center.remove(data_info_id));

        match removed {
            Some((_, datum)) => {
                for (register_id, publisher) in &datum.pub_map {
                    self.client_index
                        .remove(&publisher.source_address().address_string(), register_id);
                }
                debug!(
                    component = COMPONENT,
                    data_info_id, data_center, "datum cleaned"
                );
                true
            }
            None => false,
        }
    }
}
