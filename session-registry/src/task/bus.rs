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

//! Fire-and-forget task event bus.

use crate::observability::events;
use crate::task::event::{TaskEvent, TaskPayload};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const COMPONENT: &str = "task_bus";

/// Sender half of the task pipeline. Cloned freely; the receiver goes to the
/// surrounding system's worker pool. Emission never blocks, and an event
/// with no one left to receive it is logged and dropped.
#[derive(Clone)]
pub struct TaskEventBus {
    sender: mpsc::UnboundedSender<TaskEvent>,
}

impl TaskEventBus {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TaskEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, payload: TaskPayload) {
        let event = TaskEvent::new(payload);
        debug!(
            event = events::TASK_EMITTED,
            component = COMPONENT,
            task_kind = event.kind(),
            task_id = %event.task_id,
            "send task event"
        );
        if self.sender.send(event).is_err() {
            warn!(
                event = events::TASK_EMIT_FAILED,
                component = COMPONENT,
                "task receiver dropped, event discarded"
            );
        }
    }
}
