/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
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

use integration_test_utils::{recording_handler, MessageLog};
use msg_router::{Control, Controllable, Message, RouterContext, SinkMode};
use std::sync::Arc;

#[allow(dead_code)]
pub(crate) const FOREIGN_CLIENT: &str = "3f1c4a52-7a1b-4f0e-9d55-0d2f3e6b9a10";

/// Entity answering every state command with a STATE_CHANGED event.
///
/// The event keeps the command's client id, so it is routed back to the sender only.
#[allow(dead_code)]
pub(crate) fn echo_entity(ctx: &RouterContext) -> Arc<Controllable> {
    let evt_hub = ctx.hub(SinkMode::Synchronous);
    let events = evt_hub.sink().clone();
    let cmd_sink = ctx.sink(move |cmd: &mut Message| {
        if let Some((last, context, var, value)) = cmd.state_parts() {
            let mut evt = Message::state_changed(last, context, var, value.clone());
            if let Some(client_id) = cmd.client_id() {
                evt.set_client_id(client_id);
            }
            events.put_copy(&evt);
        }
        true
    });
    ctx.controllable(cmd_sink, evt_hub)
}

/// Control whose events are recorded synchronously into the returned log.
#[allow(dead_code)]
pub(crate) fn recording_frontend(
    ctx: &RouterContext,
    upstream: &Arc<Controllable>,
) -> (Arc<Control>, MessageLog) {
    let log = MessageLog::new();
    let control = ctx.control(ctx.sink(recording_handler(&log)));
    upstream.connect(&control);
    (control, log)
}

#[allow(dead_code)]
pub(crate) fn volume(value: f64) -> Message {
    Message::set_state(true, "audio", "volume", value)
}
