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

//! Data-tier write and version-query contract.

use crate::error::SessionError;
use async_trait::async_trait;
use datum_cache::Publisher;
use std::collections::HashMap;

/// data_center -> data_info_id -> version, as reported by one data node.
pub type DataVersions = HashMap<String, HashMap<String, i64>>;

/// Transfers registration data to the data tier. Routing a write to the
/// right node is the implementation's concern; the session tier only applies
/// the retry policy on top.
#[async_trait]
pub trait DataNodeService: Send + Sync {
    async fn register(&self, publisher: &Publisher) -> Result<(), SessionError>;

    async fn unregister(&self, publisher: &Publisher) -> Result<(), SessionError>;

    /// One batched version fetch against `target` for the given service
    /// keys. An empty result means the node holds no data for them.
    async fn fetch_data_version(
        &self,
        target: &str,
        data_info_ids: Vec<String>,
    ) -> Result<DataVersions, SessionError>;
}
