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

//! Remoting layer.
//!
//! Contracts for the collaborators the session tier calls out to: the data
//! tier's write/version surface, data-node location, meta-leader resolution,
//! and the connection registry. The surrounding system injects
//! implementations as `Arc<dyn …>`; this crate never opens a socket itself.
//! `retry` holds the one remote-call policy used everywhere: a single retry
//! against a freshly resolved target.

mod connections;
mod data_node;
mod meta_leader;
mod node_locator;
pub(crate) mod retry;

pub use connections::ConnectionRegistry;
pub use data_node::{DataNodeService, DataVersions};
pub use meta_leader::MetaLeaderService;
pub use node_locator::{NodeLocator, StaticNodeLocator};
