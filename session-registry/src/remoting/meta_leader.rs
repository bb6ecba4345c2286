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

//! Meta-tier leader resolution, consumed only as current/refreshed address.

/// The RAFT leader of the meta tier as seen by this node. `refresh_leader`
/// re-resolves after a failed call and returns the (possibly new) leader;
/// election mechanics live entirely behind the implementation.
pub trait MetaLeaderService: Send + Sync {
    fn leader(&self) -> String;

    fn refresh_leader(&self) -> String;
}
