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

//! # session-registry
//!
//! `session-registry` is the session tier of the clustered service registry:
//! it owns the registration lifecycle for publishers, subscribers, and
//! watchers, tracks subscriber interest per service key, and detects when
//! the data tier's versions have advanced so downstream push work can be
//! triggered.
//!
//! Typical usage is API-first and centered on [`SessionRegistry`]. The
//! surrounding system injects its remoting collaborators as `Arc<dyn …>`
//! trait objects and consumes the [`TaskEvent`] receiver with its own
//! worker pool.
//!
//! ## Quick start
//!
//! ```
//! use session_registry::{
//!     ConnectionRegistry, DatumKey, SessionCacheService, SessionConfig, SessionRegistry,
//!     StaticNodeLocator, StoreData, Subscriber, SubscriberScope, MetaLeaderService,
//! };
//! use datum_cache::SourceAddress;
//! use std::sync::Arc;
//!
//! # use async_trait::async_trait;
//! # use datum_cache::Publisher;
//! # use session_registry::{DataNodeService, DataVersions, SessionError};
//! #
//! # struct NoopDataNode;
//! #
//! # #[async_trait]
//! # impl DataNodeService for NoopDataNode {
//! #     async fn register(&self, _publisher: &Publisher) -> Result<(), SessionError> {
//! #         Ok(())
//! #     }
//! #
//! #     async fn unregister(&self, _publisher: &Publisher) -> Result<(), SessionError> {
//! #         Ok(())
//! #     }
//! #
//! #     async fn fetch_data_version(
//! #         &self,
//! #         _target: &str,
//! #         _data_info_ids: Vec<String>,
//! #     ) -> Result<DataVersions, SessionError> {
//! #         Ok(DataVersions::new())
//! #     }
//! # }
//! #
//! # struct FixedLeader;
//! #
//! # impl MetaLeaderService for FixedLeader {
//! #     fn leader(&self) -> String {
//! #         "10.0.2.1:9615".to_string()
//! #     }
//! #
//! #     fn refresh_leader(&self) -> String {
//! #         self.leader()
//! #     }
//! # }
//! #
//! # struct AlwaysOpen;
//! #
//! # impl ConnectionRegistry for AlwaysOpen {
//! #     fn is_channel_open(&self, _address: &str) -> bool {
//! #         true
//! #     }
//! # }
//! #
//! # struct NoopCache;
//! #
//! # impl SessionCacheService for NoopCache {
//! #     fn invalidate(&self, _key: &DatumKey) {}
//! # }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let config = SessionConfig::default();
//! let (registry, mut task_events) = SessionRegistry::new(
//!     &config,
//!     Arc::new(NoopDataNode),
//!     Arc::new(StaticNodeLocator::new(vec!["10.0.1.1:9620".to_string()])),
//!     Arc::new(FixedLeader),
//!     Arc::new(AlwaysOpen),
//!     Arc::new(NoopCache),
//! );
//!
//! registry
//!     .register(StoreData::Subscriber(Subscriber {
//!         register_id: "s1".to_string(),
//!         data_info_id: "svc:1.0".to_string(),
//!         source_address: SourceAddress::new("10.0.0.1", 100),
//!         scope: SubscriberScope::Zone,
//!     }))
//!     .await
//!     .unwrap();
//!
//! let event = task_events.recv().await.unwrap();
//! assert_eq!(event.kind(), "SUBSCRIBER_REGISTER_FETCH_TASK");
//! assert_eq!(registry.interests().get_interests("svc:1.0").len(), 1);
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: outward [`SessionRegistry`] lifecycle surface
//! - Store: interest tracker, watcher table, session publisher table
//! - Change: version fetch loop and change-event derivation
//! - Remoting: collaborator contracts and the single-retry policy
//! - Task: fire-and-forget event pipeline toward the worker pool
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events. Library code emits
//! events/spans and does not unconditionally initialize a global subscriber.
//! Binaries/tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod cache;
mod change;
mod config;
mod error;
mod model;
#[doc(hidden)]
pub mod observability;
mod registry;
mod remoting;
mod store;
mod task;

pub use cache::{DatumKey, SessionCacheService};
pub use change::ChangeDetector;
pub use config::{SessionConfig, SessionFlags};
pub use error::SessionError;
pub use model::{StoreData, Subscriber, SubscriberScope, Watcher};
pub use registry::SessionRegistry;
pub use remoting::{
    ConnectionRegistry, DataNodeService, DataVersions, MetaLeaderService, NodeLocator,
    StaticNodeLocator,
};
pub use store::{Interests, SessionDataStore, Watchers};
pub use task::{TaskEvent, TaskEventBus, TaskPayload};
