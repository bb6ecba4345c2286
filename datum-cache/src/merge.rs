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

//! Conflict resolution between an incoming datum and the cached one.

use crate::client_index::ClientIndex;
use crate::datum::{Datum, MergeResult};
use crate::record::Publisher;
use tracing::debug;

const COMPONENT: &str = "merge_resolver";

/// How an incoming datum relates to the cached one: an incremental record
/// set to reconcile, or a complete snapshot that supersedes the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutMode {
    Merge,
    Cover,
}

/// Reconciles each incoming record against the cached datum independently;
/// one stale record never blocks the rest of the batch.
pub(crate) fn merge_datum(
    cached: &mut Datum,
    incoming: Datum,
    client_index: &ClientIndex,
) -> MergeResult {
    let incoming_datum_version = incoming.version;
    let mut changed = false;

    for (register_id, incoming_pub) in incoming.pub_map {
        match incoming_pub {
            Publisher::Tombstone { ref base } => {
                let Some(cached_pub) = cached.pub_map.get(&register_id) else {
                    continue;
                };
                // a registration that re-registered after a disconnect must not
                // be erased by a late-arriving unpublish from the old connection
                if base.register_timestamp <= cached_pub.register_timestamp() {
                    debug!(
                        component = COMPONENT,
                        register_id,
                        incoming_timestamp = base.register_timestamp,
                        cached_timestamp = cached_pub.register_timestamp(),
                        "stale tombstone ignored"
                    );
                    continue;
                }
                let address = cached_pub.source_address().address_string();
                cached.pub_map.remove(&register_id);
                client_index.remove(&address, &register_id);
                changed = true;
            }
            Publisher::Live { .. } => {
                let incoming_address = incoming_pub.source_address().address_string();
                let incoming_version = incoming_pub.version();
                let (cached_version, cached_address) = match cached.pub_map.get(&register_id) {
                    Some(cached_pub) => (
                        cached_pub.version(),
                        cached_pub.source_address().address_string(),
                    ),
                    None => (0, String::new()),
                };

                if cached_version > incoming_version {
                    debug!(
                        component = COMPONENT,
                        register_id, incoming_version, cached_version, "stale live record ignored"
                    );
                    continue;
                }

                // same version from a new address happens when a session node
                // crashes and the client reconnects through another one; a new
                // version with a new address is a plain client restart
                let meaningful =
                    cached_version < incoming_version || cached_address != incoming_address;
                cached
                    .pub_map
                    .insert(register_id.clone(), incoming_pub.clone());
                if meaningful {
                    client_index.remove(&cached_address, &register_id);
                    client_index.insert(incoming_pub);
                    changed = true;
                }
            }
        }
    }

    let previous_version = cached.version;
    if changed {
        cached.version = incoming_datum_version;
    }
    MergeResult::new(Some(previous_version), changed)
}

/// Replaces the cached datum with a complete snapshot, repointing the
/// reverse index for every surviving live record and dropping index entries
/// for records the snapshot no longer carries (or carries at a new address).
/// Returns the cached version seen at the start; an identical incoming
/// version leaves the cache untouched.
pub(crate) fn cover_datum(cached: &mut Datum, incoming: Datum, client_index: &ClientIndex) -> i64 {
    if incoming.version == cached.version {
        debug!(
            component = COMPONENT,
            data_info_id = %cached.data_info_id,
            version = cached.version,
            "snapshot version unchanged, nothing to cover"
        );
        return cached.version;
    }

    let previous = std::mem::replace(cached, incoming);
    let previous_version = previous.version;
    let mut stale = previous.pub_map;

    for (register_id, publisher) in &cached.pub_map {
        if publisher.is_tombstone() {
            continue;
        }
        client_index.insert(publisher.clone());
        let survived_in_place = stale.get(register_id).is_some_and(|old_pub| {
            old_pub.source_address().address_string()
                == publisher.source_address().address_string()
        });
        if survived_in_place {
            stale.remove(register_id);
        }
    }

    for (register_id, old_pub) in stale {
        client_index.remove(&old_pub.source_address().address_string(), &register_id);
    }

    previous_version
}

#[cfg(test)]
mod tests {
    use super::{cover_datum, merge_datum};
    use crate::client_index::ClientIndex;
    use crate::datum::Datum;
    use crate::record::{Publisher, RegistrationBase, SourceAddress};
    use serde_json::json;

    fn base(register_id: &str, host: &str, port: u16, version: i64, timestamp: i64) -> RegistrationBase {
        RegistrationBase {
            register_id: register_id.to_string(),
            data_info_id: "svc:1.0".to_string(),
            source_address: SourceAddress::new(host, port),
            version,
            register_timestamp: timestamp,
        }
    }

    fn live(register_id: &str, host: &str, port: u16, version: i64, timestamp: i64) -> Publisher {
        Publisher::live(
            base(register_id, host, port, version, timestamp),
            json!([format!("{host}:{port}")]),
        )
    }

    fn seeded(publisher: Publisher) -> (Datum, ClientIndex) {
        let index = ClientIndex::new();
        index.insert(publisher.clone());
        let datum = Datum::new("DC1", "svc:1.0", 1).with_publisher(publisher);
        (datum, index)
    }

    #[test]
    fn stale_tombstone_leaves_cache_unmodified() {
        let (mut cached, index) = seeded(live("r1", "10.0.0.1", 100, 1, 10));
        let incoming = Datum::new("DC1", "svc:1.0", 2)
            .with_publisher(Publisher::tombstone(base("r1", "10.0.0.1", 100, 1, 5)));

        let result = merge_datum(&mut cached, incoming, &index);

        assert!(!result.changed);
        assert_eq!(cached.version, 1);
        assert!(cached.pub_map.contains_key("r1"));
        assert!(index.contains("10.0.0.1:100", "r1"));
    }

    #[test]
    fn newer_tombstone_removes_record_and_index_entry() {
        let (mut cached, index) = seeded(live("r1", "10.0.0.1", 100, 1, 10));
        let incoming = Datum::new("DC1", "svc:1.0", 2)
            .with_publisher(Publisher::tombstone(base("r1", "10.0.0.1", 100, 1, 11)));

        let result = merge_datum(&mut cached, incoming, &index);

        assert!(result.changed);
        assert_eq!(result.previous_version, Some(1));
        assert_eq!(cached.version, 2);
        assert!(cached.pub_map.is_empty());
        assert!(!index.contains("10.0.0.1:100", "r1"));
    }

    #[test]
    fn equal_timestamp_tombstone_is_stale() {
        let (mut cached, index) = seeded(live("r1", "10.0.0.1", 100, 1, 10));
        let incoming = Datum::new("DC1", "svc:1.0", 2)
            .with_publisher(Publisher::tombstone(base("r1", "10.0.0.1", 100, 1, 10)));

        let result = merge_datum(&mut cached, incoming, &index);

        assert!(!result.changed);
        assert!(cached.pub_map.contains_key("r1"));
    }

    #[test]
    fn lower_version_live_record_is_ignored() {
        let (mut cached, index) = seeded(live("r1", "10.0.0.1", 100, 2, 10));
        let incoming =
            Datum::new("DC1", "svc:1.0", 3).with_publisher(live("r1", "10.0.0.1", 100, 1, 20));

        let result = merge_datum(&mut cached, incoming, &index);

        assert!(!result.changed);
        assert_eq!(cached.version, 1);
        assert_eq!(cached.pub_map["r1"].version(), 2);
    }

    #[test]
    fn same_version_resend_is_a_no_op() {
        let (mut cached, index) = seeded(live("r1", "10.0.0.1", 100, 1, 10));
        let incoming =
            Datum::new("DC1", "svc:1.0", 2).with_publisher(live("r1", "10.0.0.1", 100, 1, 10));

        let result = merge_datum(&mut cached, incoming, &index);

        assert!(!result.changed);
        assert_eq!(cached.version, 1);
    }

    #[test]
    fn same_version_new_address_repoints_the_index() {
        let (mut cached, index) = seeded(live("r1", "10.0.0.1", 100, 1, 10));
        let incoming =
            Datum::new("DC1", "svc:1.0", 2).with_publisher(live("r1", "10.0.0.2", 200, 1, 12));

        let result = merge_datum(&mut cached, incoming, &index);

        assert!(result.changed);
        assert_eq!(cached.version, 2);
        assert!(!index.contains("10.0.0.1:100", "r1"));
        assert!(index.contains("10.0.0.2:200", "r1"));
    }

    #[test]
    fn cover_with_identical_version_changes_nothing() {
        let (mut cached, index) = seeded(live("r1", "10.0.0.1", 100, 1, 10));
        let incoming =
            Datum::new("DC1", "svc:1.0", 1).with_publisher(live("r2", "10.0.0.3", 300, 1, 10));

        let previous = cover_datum(&mut cached, incoming, &index);

        assert_eq!(previous, 1);
        assert!(cached.pub_map.contains_key("r1"));
        assert!(!cached.pub_map.contains_key("r2"));
        assert!(!index.contains("10.0.0.3:300", "r2"));
    }

    #[test]
    fn cover_drops_index_entries_for_records_missing_from_the_snapshot() {
        let index = ClientIndex::new();
        let kept = live("r1", "10.0.0.1", 100, 1, 10);
        let dropped = live("r2", "10.0.0.2", 200, 1, 10);
        index.insert(kept.clone());
        index.insert(dropped.clone());
        let mut cached = Datum::new("DC1", "svc:1.0", 1)
            .with_publisher(kept)
            .with_publisher(dropped);

        let incoming =
            Datum::new("DC1", "svc:1.0", 5).with_publisher(live("r1", "10.0.0.1", 100, 2, 20));
        let previous = cover_datum(&mut cached, incoming, &index);

        assert_eq!(previous, 1);
        assert_eq!(cached.version, 5);
        assert!(index.contains("10.0.0.1:100", "r1"));
        assert!(!index.contains("10.0.0.2:200", "r2"));
    }

    #[test]
    fn cover_drops_the_old_entry_when_a_record_moved_address() {
        let (mut cached, index) = seeded(live("r1", "10.0.0.1", 100, 1, 10));
        let incoming =
            Datum::new("DC1", "svc:1.0", 4).with_publisher(live("r1", "10.0.0.2", 200, 2, 20));

        cover_datum(&mut cached, incoming, &index);

        assert!(!index.contains("10.0.0.1:100", "r1"));
        assert!(index.contains("10.0.0.2:200", "r1"));
    }
}
