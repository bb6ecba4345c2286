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

//! Interest tracker: subscriber sets and last-seen versions per service key.

use crate::model::Subscriber;
use crate::store::session_store::{SessionItem, SessionStore};
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;

const COMPONENT: &str = "interests";

impl SessionItem for Subscriber {
    fn register_id(&self) -> &str {
        &self.register_id
    }

    fn data_info_id(&self) -> &str {
        &self.data_info_id
    }

    fn connect_id(&self) -> String {
        Subscriber::connect_id(self)
    }
}

/// Which subscribers care about which service keys, and the highest
/// data-tier version already observed per (key, data center). The version
/// gate is what makes duplicate fetch-loop polls idempotent.
pub struct Interests {
    store: SessionStore<Subscriber>,
    /// data_info_id -> data_center -> highest version already observed
    versions: DashMap<String, HashMap<String, i64>>,
}

impl Default for Interests {
    fn default() -> Self {
        Self::new()
    }
}

impl Interests {
    pub fn new() -> Self {
        Self {
            store: SessionStore::new(),
            versions: DashMap::new(),
        }
    }

    pub fn add(&self, subscriber: Subscriber) {
        self.store.add(subscriber);
    }

    pub fn delete_by_id(&self, register_id: &str, data_info_id: &str) -> bool {
        self.store.delete_by_id(register_id, data_info_id).is_some()
    }

    pub fn delete_by_connect_id(&self, connect_id: &str) -> Vec<Subscriber> {
        self.store.delete_by_connect_id(connect_id)
    }

    pub fn get_interests(&self, data_info_id: &str) -> Vec<Subscriber> {
        self.store.get(data_info_id)
    }

    pub fn get_by_connect_id(&self, connect_id: &str) -> Vec<Subscriber> {
        self.store.get_by_connect_id(connect_id)
    }

    /// Service keys with at least one interested subscriber.
    pub fn interest_data_info_ids(&self) -> Vec<String> {
        self.store.non_empty_keys()
    }

    /// Accepts a fetched version as news only if it is strictly greater than
    /// the last one observed for this (key, data center) pair, advancing the
    /// tracker as a side effect of acceptance. Tracked versions only ever
    /// move forward.
    pub fn check_interest_version(
        &self,
        data_center: &str,
        data_info_id: &str,
        version: i64,
    ) -> bool {
        if self.store.is_empty_key(data_info_id) {
            return false;
        }
        let mut tracked = self.versions.entry(data_info_id.to_string()).or_default();
        let last = tracked.get(data_center).copied().unwrap_or(0);
        if version > last {
            tracked.insert(data_center.to_string(), version);
            true
        } else {
            debug!(
                component = COMPONENT,
                data_center = %data_center,
                data_info_id = %data_info_id,
                version,
                last,
                "fetched version is not news"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Interests;
    use crate::model::{Subscriber, SubscriberScope};
    use datum_cache::SourceAddress;

    fn subscriber(register_id: &str, data_info_id: &str, port: u16) -> Subscriber {
        Subscriber {
            register_id: register_id.to_string(),
            data_info_id: data_info_id.to_string(),
            source_address: SourceAddress::new("192.168.1.2", port),
            scope: SubscriberScope::Zone,
        }
    }

    #[test]
    fn version_acceptance_is_strictly_monotonic() {
        let interests = Interests::new();
        interests.add(subscriber("s1", "svc:1.0", 7001));

        assert!(interests.check_interest_version("DC1", "svc:1.0", 1));
        assert!(!interests.check_interest_version("DC1", "svc:1.0", 1));
        assert!(interests.check_interest_version("DC1", "svc:1.0", 3));
        assert!(!interests.check_interest_version("DC1", "svc:1.0", 2));
    }

    #[test]
    fn versions_are_tracked_per_data_center() {
        let interests = Interests::new();
        interests.add(subscriber("s1", "svc:1.0", 7001));

        assert!(interests.check_interest_version("DC1", "svc:1.0", 5));
        assert!(interests.check_interest_version("DC2", "svc:1.0", 1));
        assert!(!interests.check_interest_version("DC2", "svc:1.0", 1));
    }

    #[test]
    fn a_version_for_an_uninterested_key_is_not_news() {
        let interests = Interests::new();
        assert!(!interests.check_interest_version("DC1", "svc:1.0", 1));

        interests.add(subscriber("s1", "svc:1.0", 7001));
        interests.delete_by_id("s1", "svc:1.0");
        assert!(!interests.check_interest_version("DC1", "svc:1.0", 2));
    }

    #[test]
    fn interest_keys_reflect_only_non_empty_subscriber_sets() {
        let interests = Interests::new();
        interests.add(subscriber("s1", "svc:1.0", 7001));
        interests.add(subscriber("s2", "svc:2.0", 7002));
        interests.delete_by_id("s2", "svc:2.0");

        assert_eq!(
            interests.interest_data_info_ids(),
            vec!["svc:1.0".to_string()]
        );
    }
}
