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

//! Single-retry-with-refresh policy for remote calls: max attempts = 2,
//! refresh the target between them, second failure propagates.

use crate::error::SessionError;
use crate::observability::events;
use crate::remoting::meta_leader::MetaLeaderService;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const COMPONENT: &str = "remote_retry";

async fn attempt<T>(
    operation: &'static str,
    call_timeout: Duration,
    call: impl Future<Output = Result<T, SessionError>>,
) -> Result<T, SessionError> {
    match tokio::time::timeout(call_timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SessionError::RemoteCallFailed {
            operation,
            detail: format!("timed out after {}ms", call_timeout.as_millis()),
        }),
    }
}

/// Calls a leader-routed operation, refreshing the meta leader and retrying
/// exactly once on failure. The implementation routes by its own view of the
/// leader; `refresh_leader` updates that view between the attempts.
pub(crate) async fn with_refreshed_leader<T, Call, Fut>(
    operation: &'static str,
    call_timeout: Duration,
    meta_leader: &dyn MetaLeaderService,
    call: Call,
) -> Result<T, SessionError>
where
    Call: Fn() -> Fut,
    Fut: Future<Output = Result<T, SessionError>>,
{
    debug!(
        component = COMPONENT,
        operation,
        leader = %meta_leader.leader(),
        "sending leader-routed request"
    );
    match attempt(operation, call_timeout, call()).await {
        Ok(value) => Ok(value),
        Err(first_error) => {
            let leader = meta_leader.refresh_leader();
            warn!(
                event = events::REMOTE_RETRY,
                component = COMPONENT,
                operation,
                leader = %leader,
                err = %first_error,
                "request send error, retrying once against new leader"
            );
            attempt(operation, call_timeout, call()).await
        }
    }
}

/// Calls an address-targeted operation, re-resolving the target and retrying
/// exactly once on failure. When re-resolution yields nothing the original
/// target is tried again.
pub(crate) async fn with_refreshed_target<T, Refresh, Call, Fut>(
    operation: &'static str,
    call_timeout: Duration,
    target: String,
    refresh: Refresh,
    call: Call,
) -> Result<T, SessionError>
where
    Refresh: FnOnce() -> Option<String>,
    Call: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, SessionError>>,
{
    match attempt(operation, call_timeout, call(target.clone())).await {
        Ok(value) => Ok(value),
        Err(first_error) => {
            let refreshed = refresh().unwrap_or(target);
            warn!(
                event = events::REMOTE_RETRY,
                component = COMPONENT,
                operation,
                target = %refreshed,
                err = %first_error,
                "request send error, retrying once against refreshed target"
            );
            attempt(operation, call_timeout, call(refreshed)).await
        }
    }
}
