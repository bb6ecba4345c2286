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

//! Publisher registration records and their source-address identity.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Client address a registration arrived from: `host:port` plus optional
/// query attributes. Attributes never participate in address identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAddress {
    host: String,
    port: u16,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    attributes: HashMap<String, String>,
}

impl SourceAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The identity string this address is indexed under.
    pub fn address_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }
}

impl Display for SourceAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Identity and ordering fields shared by a live registration and its
/// tombstone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistrationBase {
    /// Unique within one datum's publisher map.
    pub register_id: String,
    /// Service key the registration belongs to.
    pub data_info_id: String,
    pub source_address: SourceAddress,
    /// Data-center-local logical version.
    pub version: i64,
    /// Millisecond timestamp assigned when the registration was accepted.
    pub register_timestamp: i64,
}

/// One client's registration of endpoint data for a service key.
///
/// The tombstone variant marks a previous registration as withdrawn; merge
/// behavior dispatches on the variant, never on runtime type inspection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Publisher {
    Live {
        base: RegistrationBase,
        /// Service endpoint payload. Encoding is the caller's concern.
        data: Value,
    },
    Tombstone { base: RegistrationBase },
}

impl Publisher {
    pub fn live(base: RegistrationBase, data: Value) -> Self {
        Publisher::Live { base, data }
    }

    pub fn tombstone(base: RegistrationBase) -> Self {
        Publisher::Tombstone { base }
    }

    pub fn base(&self) -> &RegistrationBase {
        match self {
            Publisher::Live { base, .. } | Publisher::Tombstone { base } => base,
        }
    }

    pub fn register_id(&self) -> &str {
        &self.base().register_id
    }

    pub fn data_info_id(&self) -> &str {
        &self.base().data_info_id
    }

    pub fn source_address(&self) -> &SourceAddress {
        &self.base().source_address
    }

    pub fn version(&self) -> i64 {
        self.base().version
    }

    pub fn register_timestamp(&self) -> i64 {
        self.base().register_timestamp
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Publisher::Tombstone { .. })
    }
}
