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

//! Session-server configuration model and runtime switches.

use crate::error::SessionError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Static configuration of one session node. Loaded once at bootstrap;
/// switches that change at runtime live in [`SessionFlags`].
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub session_server_region: String,
    pub data_server_port: u16,
    /// Cadence of the change-detection fetch loop.
    pub fetch_interval_millis: u64,
    /// Per-attempt budget for remote calls; a timed-out attempt counts as a
    /// failure for the retry policy.
    pub remote_call_timeout_millis: u64,
    pub stop_push_switch: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_server_region: "DEFAULT_ZONE".to_string(),
            data_server_port: 9620,
            fetch_interval_millis: 500,
            remote_call_timeout_millis: 3000,
            stop_push_switch: false,
        }
    }
}

impl SessionConfig {
    /// Reads a JSON5 config file; absent keys fall back to defaults.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let raw = fs::read_to_string(path.as_ref()).map_err(|error| {
            SessionError::InvalidConfig {
                detail: format!("unable to read config file: {error}"),
            }
        })?;
        json5::from_str(&raw).map_err(|error| SessionError::InvalidConfig {
            detail: format!("unable to parse config: {error}"),
        })
    }
}

/// Runtime-mutable switches. The meta tier provides both after bootstrap:
/// `stop_push` suppresses fetch-and-push work for newly registered
/// subscribers, `begin_data_fetch` arms the change-detection loop once push
/// delivery from the data tier has been disabled.
pub struct SessionFlags {
    stop_push: AtomicBool,
    begin_data_fetch: AtomicBool,
}

impl SessionFlags {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            stop_push: AtomicBool::new(config.stop_push_switch),
            begin_data_fetch: AtomicBool::new(false),
        }
    }

    pub fn stop_push(&self) -> bool {
        self.stop_push.load(Ordering::Relaxed)
    }

    pub fn set_stop_push(&self, value: bool) {
        self.stop_push.store(value, Ordering::Relaxed);
    }

    pub fn begin_data_fetch(&self) -> bool {
        self.begin_data_fetch.load(Ordering::Relaxed)
    }

    pub fn set_begin_data_fetch(&self, value: bool) {
        self.begin_data_fetch.store(value, Ordering::Relaxed);
    }
}
