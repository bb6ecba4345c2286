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

//! # datum-cache
//!
//! `datum-cache` is the data-tier registration cache of the clustered service
//! registry: it stores, merges, and reconciles publisher registrations under
//! concurrent, possibly conflicting updates.
//!
//! One [`Datum`] holds the registration set for one service key within one
//! data center, versioned as a unit. Incoming writes go through
//! [`DatumCache::put_datum`] in one of two modes: [`PutMode::Merge`]
//! reconciles an incremental record set against the cache (version-gated
//! acceptance, timestamp-ordered tombstones), [`PutMode::Cover`] replaces the
//! cached set with a complete snapshot. A reverse client index answers
//! "everything this client connection registered" for disconnect handling.
//!
//! ```
//! use datum_cache::{Datum, DatumCache, Publisher, PutMode, RegistrationBase, SourceAddress};
//! use serde_json::json;
//!
//! let cache = DatumCache::new();
//! let record = Publisher::live(
//!     RegistrationBase {
//!         register_id: "r1".to_string(),
//!         data_info_id: "svc:1.0".to_string(),
//!         source_address: SourceAddress::new("10.0.0.1", 100),
//!         version: 1,
//!         register_timestamp: 10,
//!     },
//!     json!(["10.0.0.1:8080"]),
//! );
//! let datum = Datum::new("DC1", "svc:1.0", 1).with_publisher(record);
//!
//! let result = cache.put_datum(PutMode::Merge, datum);
//! assert!(result.changed);
//! assert_eq!(cache.get("DC1", "svc:1.0").unwrap().version, 1);
//! assert!(cache.get_by_client_address("10.0.0.1:100").is_some());
//! ```
//!
//! ## Concurrency model
//!
//! The datum map and the reverse index are independent concurrent maps with
//! no joint lock; writers for one (data center, service key) pair are
//! serialized by the map's entry guard, and a write updates the two
//! structures as separate steps. See [`DatumCache`] for the visibility
//! consequences.
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events. Library code emits events
//! and does not initialize a global subscriber.

mod client_index;
mod datum;
mod merge;
mod record;
mod store;

pub use datum::{Datum, MergeResult, ERROR_DATUM_VERSION};
pub use merge::PutMode;
pub use record::{Publisher, RegistrationBase, SourceAddress};
pub use store::DatumCache;
