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

//! # msg-router
//!
//! `msg-router` moves typed messages between the components of a media application:
//! frontends send commands to entities (players, databases) and receive their events,
//! possibly through intermediate proxies, without ever echoing a message back to the
//! component it came from.
//!
//! Typical usage goes through a [`RouterContext`], which carries the [`RouterConfig`] and
//! builds sinks, hubs, controllables and controls.
//!
//! ## Command and event round trip
//!
//! ```
//! use msg_router::{ns, state, Message, RouterContext, SinkMode};
//!
//! let ctx = RouterContext::default();
//!
//! // The entity answers every SET_STATE with a STATE_CHANGED addressed to the sender.
//! let evt_hub = ctx.hub(SinkMode::Synchronous);
//! let events = evt_hub.sink().clone();
//! let player = ctx.controllable(
//!     ctx.sink(move |cmd: &mut Message| {
//!         if let Some((last, context, var, value)) = cmd.state_parts() {
//!             let mut evt = Message::state_changed(last, context, var, value.clone());
//!             if let Some(client_id) = cmd.client_id() {
//!                 evt.set_client_id(client_id);
//!             }
//!             events.put_copy(&evt);
//!         }
//!         true
//!     }),
//!     evt_hub,
//! );
//!
//! let frontend = ctx.control(ctx.queue_sink());
//! player.connect(&frontend);
//!
//! frontend
//!     .cmd_sink()
//!     .put_copy(&Message::set_state(true, "audio", "volume", 0.5));
//!
//! let event = frontend.evt_sink().get_read()?.expect("event should be routed back");
//! assert!(event.is(ns::STATE, state::STATE_CHANGED));
//! assert_eq!(event.client_id(), Some(frontend.id()));
//! frontend.evt_sink().done_read(event);
//! # Ok::<(), msg_router::RouterError>(())
//! ```
//!
//! ## Internal architecture map
//!
//! - Data plane: message queue, sinks and hubs
//! - Routing: per-sink routing table of recently seen client ids, hub state cache
//! - Control plane: controls, controllables and bridges chaining them
//! - Runtime: pump threads draining buffered sinks
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events and never initializes a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber` initialization.

mod config;
pub use config::RouterConfig;

mod context;
pub use context::RouterContext;

mod control_plane;
pub use control_plane::bridge::ControlBridge;
pub use control_plane::control::Control;
pub use control_plane::controllable::Controllable;

mod data_plane;
pub use data_plane::hub::MsgHub;
pub use data_plane::queue::MsgQueue;
pub use data_plane::sink::{MsgHandler, MsgSink, MsgWriteGuard, SinkMode, WILDCARD_ID};

mod error;
pub use error::RouterError;

mod message;
pub use message::{generic, ns, state, Message, Value};

#[doc(hidden)]
pub mod observability;
mod routing;
pub use routing::routing_table::{RoutingTable, DEFAULT_ROUTING_TABLE_CAPACITY};
pub use routing::state_cache::StateSnapshot;

mod runtime;
pub use runtime::pump_runtime::{spawn_pump, PumpHandle};

mod sync_util;
