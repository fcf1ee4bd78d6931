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

//! Proxy controllable chained in front of another controllable.

use crate::config::RouterConfig;
use crate::control_plane::control::Control;
use crate::control_plane::controllable::Controllable;
use crate::data_plane::hub::MsgHub;
use crate::data_plane::sink::{MsgSink, SinkMode};
use crate::message::Message;
use std::sync::Arc;

/// A controllable that forwards its commands to `upstream` and republishes the
/// upstream's events on its own hub.
///
/// Frontends connect to [`ControlBridge::controllable`] exactly as they would connect
/// to the upstream itself. Commands keep the client id stamped by the frontend's
/// control; the internal control records it, so addressed replies travel back through
/// this bridge and reach only the frontend that asked.
pub struct ControlBridge {
    controllable: Arc<Controllable>,
    control: Arc<Control>,
}

impl ControlBridge {
    pub fn new(upstream: &Arc<Controllable>) -> Self {
        Self::with_config(upstream, RouterConfig::default())
    }

    pub(crate) fn with_config(upstream: &Arc<Controllable>, config: RouterConfig) -> Self {
        let capacity = config.routing_table_capacity;

        let evt_hub = MsgHub::with_capacity(SinkMode::Synchronous, capacity);
        let republish = evt_hub.sink().clone();
        let upstream_events = Arc::new(MsgSink::build(
            Some(Box::new(move |msg: &mut Message| {
                republish.put_copy(msg);
                true
            })),
            SinkMode::Synchronous,
            capacity,
        ));
        let control = Control::build(upstream_events, None, capacity);

        let forward = control.cmd_sink().clone();
        let cmd_sink = Arc::new(MsgSink::build(
            Some(Box::new(move |msg: &mut Message| {
                forward.put_copy(msg);
                true
            })),
            SinkMode::Synchronous,
            capacity,
        ));

        let controllable = Controllable::with_config(cmd_sink, evt_hub, config);
        upstream.connect(&control);

        Self {
            controllable,
            control,
        }
    }

    /// Downstream face, where frontends connect.
    pub fn controllable(&self) -> &Arc<Controllable> {
        &self.controllable
    }

    /// Upstream face, attached to the wrapped controllable.
    pub fn control(&self) -> &Arc<Control> {
        &self.control
    }
}

impl Drop for ControlBridge {
    fn drop(&mut self) {
        self.control.cleanup();
    }
}
