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

//! Session-tier error taxonomy.
//!
//! Rejected writes and stale updates are ordinary data at the cache layer;
//! only cross-cutting failures surface here.

use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum SessionError {
    /// A registration arrived for an address with no open channel on this
    /// session node. Fatal for the single request, never retried.
    ConnectionNotFound { address: String },
    /// A remote call failed after the single retry against a refreshed
    /// target; the calling cycle is abandoned until its next attempt.
    RemoteCallFailed {
        operation: &'static str,
        detail: String,
    },
    InvalidConfig { detail: String },
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::ConnectionNotFound { address } => {
                write!(
                    f,
                    "register address {address} has not connected this session server"
                )
            }
            SessionError::RemoteCallFailed { operation, detail } => {
                write!(f, "remote call {operation} failed: {detail}")
            }
            SessionError::InvalidConfig { detail } => {
                write!(f, "invalid session configuration: {detail}")
            }
        }
    }
}

impl Error for SessionError {}
