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

//! Event-name constants attached to structured `tracing` records.

pub mod events {
    pub const REGISTER_REJECTED_NO_CHANNEL: &str = "register_rejected_no_channel";
    pub const CANCEL_ENQUEUED: &str = "cancel_enqueued";

    pub const TASK_EMITTED: &str = "task_emitted";
    pub const TASK_EMIT_FAILED: &str = "task_emit_failed";

    pub const FETCH_TICK_SKIPPED: &str = "fetch_tick_skipped";
    pub const FETCH_VERSIONS_EMPTY: &str = "fetch_versions_empty";
    pub const FETCH_VERSIONS_FAILED: &str = "fetch_versions_failed";
    pub const INTEREST_VERSION_ADVANCED: &str = "interest_version_advanced";
    pub const DATA_CHANGE_FIRED: &str = "data_change_fired";

    pub const REMOTE_RETRY: &str = "remote_retry";
}
