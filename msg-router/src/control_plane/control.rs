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

//! Client-side control handle: a command sink forwarding upstream and an event sink
//! receiving the upstream's events.

use crate::control_plane::controllable::Controllable;
use crate::data_plane::sink::{MsgHandler, MsgSink, SinkMode};
use crate::message::Message;
use crate::observability::{events, fields};
use crate::routing::routing_table::DEFAULT_ROUTING_TABLE_CAPACITY;
use crate::sync_util::{lock, read, write};
use std::sync::{Arc, Mutex, RwLock, Weak};
use tracing::{debug, trace};
use uuid::Uuid;

const COMPONENT: &str = "control";

/// One client's view of a [`Controllable`].
///
/// Both sinks carry the control's generated id, which is stamped as client id on every
/// command entering the system here. Commands that already carry a foreign client id
/// are forwarded unchanged and the id is recorded in the event sink's routing table, so
/// replies addressed to that client find their way back through this control.
pub struct Control {
    id: String,
    cmd_sink: Arc<MsgSink>,
    evt_sink: Arc<MsgSink>,
    upstream: RwLock<Option<Weak<Controllable>>>,
    local: Option<Box<dyn MsgHandler>>,
    cleanup: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Control {
    pub fn new(evt_sink: Arc<MsgSink>) -> Arc<Self> {
        Self::build(evt_sink, None, DEFAULT_ROUTING_TABLE_CAPACITY)
    }

    /// Control whose commands are handed to `local` while no upstream is attached.
    pub fn with_local_handler<H>(evt_sink: Arc<MsgSink>, local: H) -> Arc<Self>
    where
        H: MsgHandler + 'static,
    {
        Self::build(
            evt_sink,
            Some(Box::new(local)),
            DEFAULT_ROUTING_TABLE_CAPACITY,
        )
    }

    pub(crate) fn build(
        evt_sink: Arc<MsgSink>,
        local: Option<Box<dyn MsgHandler>>,
        routing_table_capacity: usize,
    ) -> Arc<Self> {
        let id = Uuid::new_v4().hyphenated().to_string();

        Arc::new_cyclic(|control: &Weak<Control>| {
            let control = control.clone();
            let cmd_sink = Arc::new(MsgSink::build(
                Some(Box::new(move |msg: &mut Message| {
                    forward_command(&control, msg)
                })),
                SinkMode::Synchronous,
                routing_table_capacity,
            ));

            cmd_sink.set_id(&id);
            evt_sink.set_id(&id);

            debug!(
                event = events::CONTROL_CREATE,
                component = COMPONENT,
                control_id = id.as_str(),
                "control created"
            );

            Self {
                id,
                cmd_sink,
                evt_sink,
                upstream: RwLock::new(None),
                local,
                cleanup: Mutex::new(None),
            }
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Where commands are posted.
    pub fn cmd_sink(&self) -> &Arc<MsgSink> {
        &self.cmd_sink
    }

    /// Where the upstream's events arrive.
    pub fn evt_sink(&self) -> &Arc<MsgSink> {
        &self.evt_sink
    }

    pub fn upstream(&self) -> Option<Arc<Controllable>> {
        read(&self.upstream).as_ref().and_then(Weak::upgrade)
    }

    pub fn is_attached(&self) -> bool {
        self.upstream().is_some()
    }

    pub(crate) fn set_upstream(&self, upstream: Weak<Controllable>) {
        *write(&self.upstream) = Some(upstream);
    }

    pub(crate) fn clear_upstream(&self) {
        write(&self.upstream).take();
    }

    /// Registers private cleanup, run once by [`Control::cleanup`] or on drop.
    pub fn set_cleanup<F>(&self, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *lock(&self.cleanup) = Some(Box::new(cleanup));
    }

    /// Detaches from the upstream and runs the private cleanup.
    pub fn cleanup(&self) {
        if let Some(upstream) = self.upstream() {
            upstream.disconnect(self);
        }
        self.clear_upstream();

        let cleanup = lock(&self.cleanup).take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    fn handle_command(&self, msg: &mut Message) {
        let Some(upstream) = read(&self.upstream).clone() else {
            trace!(
                event = events::CONTROL_LOCAL_DELIVERY,
                component = COMPONENT,
                control_id = self.id.as_str(),
                reason = fields::REASON_NO_UPSTREAM,
                msg = fields::format_message(msg).as_str(),
                "delivering locally"
            );
            if let Some(local) = &self.local {
                local.handle(msg);
            }
            return;
        };

        match msg.client_id().map(str::to_owned) {
            None => {
                trace!(
                    event = events::CONTROL_STAMP_CLIENT_ID,
                    component = COMPONENT,
                    control_id = self.id.as_str(),
                    "stamping own id on command"
                );
                msg.set_client_id(&self.id);
            }
            Some(client_id) => {
                trace!(
                    event = events::CONTROL_RECORD_ROUTE,
                    component = COMPONENT,
                    control_id = self.id.as_str(),
                    client_id = client_id.as_str(),
                    "recording foreign client id"
                );
                self.evt_sink.routing_table().insert(&client_id);
            }
        }

        let Some(upstream) = upstream.upgrade() else {
            debug!(
                event = events::CONTROL_UPSTREAM_GONE,
                component = COMPONENT,
                control_id = self.id.as_str(),
                reason = fields::REASON_UPSTREAM_DROPPED,
                msg = fields::format_message(msg).as_str(),
                "dropping command"
            );
            return;
        };

        trace!(
            event = events::CONTROL_FORWARD,
            component = COMPONENT,
            control_id = self.id.as_str(),
            client_id = fields::format_client_id(msg).as_str(),
            msg = fields::format_message(msg).as_str(),
            "forwarding command upstream"
        );
        upstream.cmd_sink().put_copy(msg);
    }
}

impl Drop for Control {
    fn drop(&mut self) {
        self.cleanup();
    }
}

// Forwarding never reports failure: every outcome counts as handled.
fn forward_command(control: &Weak<Control>, msg: &mut Message) -> bool {
    if let Some(control) = control.upgrade() {
        control.handle_command(msg);
    }
    true
}
