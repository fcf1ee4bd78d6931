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

//! Explicit application context.
//!
//! [`RouterContext`] carries the [`RouterConfig`] into everything it builds, so sinks,
//! hubs and controls created through it share one routing-table capacity and one set of
//! poll intervals. Nothing in the crate reads process-wide state.

use crate::config::RouterConfig;
use crate::control_plane::bridge::ControlBridge;
use crate::control_plane::control::Control;
use crate::control_plane::controllable::Controllable;
use crate::data_plane::hub::MsgHub;
use crate::data_plane::sink::{MsgHandler, MsgSink, SinkMode};
use crate::error::RouterError;
use crate::runtime::pump_runtime::{self, PumpHandle};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RouterContext {
    config: RouterConfig,
}

impl RouterContext {
    /// Builds a context after validating `config`.
    pub fn new(config: RouterConfig) -> Result<Self, RouterError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Synchronous sink running `handler` on every put.
    pub fn sink<H>(&self, handler: H) -> Arc<MsgSink>
    where
        H: MsgHandler + 'static,
    {
        self.sink_with_mode(handler, SinkMode::Synchronous)
    }

    /// Buffered sink running `handler` from [`MsgSink::iteration`].
    pub fn buffered_sink<H>(&self, handler: H) -> Arc<MsgSink>
    where
        H: MsgHandler + 'static,
    {
        self.sink_with_mode(handler, SinkMode::Buffered)
    }

    /// Buffered sink without handler, drained through the read-side API.
    pub fn queue_sink(&self) -> Arc<MsgSink> {
        Arc::new(MsgSink::build(
            None,
            SinkMode::Buffered,
            self.config.routing_table_capacity,
        ))
    }

    pub fn hub(&self, mode: SinkMode) -> MsgHub {
        MsgHub::with_capacity(mode, self.config.routing_table_capacity)
    }

    pub fn controllable(&self, cmd_sink: Arc<MsgSink>, evt_hub: MsgHub) -> Arc<Controllable> {
        Controllable::with_config(cmd_sink, evt_hub, self.config.clone())
    }

    pub fn control(&self, evt_sink: Arc<MsgSink>) -> Arc<Control> {
        Control::build(evt_sink, None, self.config.routing_table_capacity)
    }

    /// Control delivering commands to `local` while it has no upstream.
    pub fn local_control<H>(&self, evt_sink: Arc<MsgSink>, local: H) -> Arc<Control>
    where
        H: MsgHandler + 'static,
    {
        Control::build(
            evt_sink,
            Some(Box::new(local)),
            self.config.routing_table_capacity,
        )
    }

    pub fn bridge(&self, upstream: &Arc<Controllable>) -> ControlBridge {
        ControlBridge::with_config(upstream, self.config.clone())
    }

    /// Pumps `sink` on its own thread at the configured interval.
    pub fn spawn_pump(&self, name: &str, sink: Arc<MsgSink>) -> Result<PumpHandle, RouterError> {
        pump_runtime::spawn_pump(name, sink, self.config.pump_interval())
    }

    fn sink_with_mode<H>(&self, handler: H, mode: SinkMode) -> Arc<MsgSink>
    where
        H: MsgHandler + 'static,
    {
        Arc::new(MsgSink::build(
            Some(Box::new(handler)),
            mode,
            self.config.routing_table_capacity,
        ))
    }
}
