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


//! Fan-out hub distributing every posted message to its connected sinks.

use crate::data_plane::sink::{MsgSink, SinkMode};
use crate::message::{ns, state, Message};
use crate::observability::{events, fields};
use crate::routing::routing_table::DEFAULT_ROUTING_TABLE_CAPACITY;
use crate::routing::state_cache::{StateCache, StateSnapshot};
use crate::sync_util::lock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, trace, warn};

const COMPONENT: &str = "msg_hub";

type ConnectCallback = Box<dyn Fn(&Arc<MsgSink>) + Send + Sync>;

/// Per-membership state shared between the hub and in-flight deliveries.
struct MemberLink {
    // Cleared by `disconnect`; checked while holding the member's write slot.
    connected: AtomicBool,
    // `Some` until the cached state has been replayed; holds traffic that arrives meanwhile.
    backlog: Mutex<Option<Vec<Message>>>,
}

impl MemberLink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

struct Member {
    // Non-owning: membership never extends a sink's lifetime.
    sink: Weak<MsgSink>,
    link: Arc<MemberLink>,
}

struct HubInner {
    members: Mutex<Vec<Member>>,
    state: Mutex<StateCache>,
    connect_cb: Mutex<Option<ConnectCallback>>,
}

/// Broadcaster over a dynamic set of sinks.
///
/// Messages enter through the hub's own sink ([`MsgHub::sink`]). A message without a
/// client id goes to every connected sink. A message with a client id goes only to the
/// first connected sink that claims the id (see [`MsgSink::has_id`]).
///
/// No hub lock is held while a member's handler runs, so handlers may connect or
/// disconnect sinks and post into the hub themselves. Once [`MsgHub::disconnect`] has
/// returned, the sink receives nothing more from this hub.
pub struct MsgHub {
    inner: Arc<HubInner>,
    sink: Arc<MsgSink>,
}

impl MsgHub {
    pub fn new(mode: SinkMode) -> Self {
        Self::with_capacity(mode, DEFAULT_ROUTING_TABLE_CAPACITY)
    }

    pub(crate) fn with_capacity(mode: SinkMode, routing_table_capacity: usize) -> Self {
        let inner = Arc::new(HubInner {
            members: Mutex::new(Vec::new()),
            state: Mutex::new(StateCache::default()),
            connect_cb: Mutex::new(None),
        });
        let dispatch_inner = inner.clone();
        let sink = Arc::new(MsgSink::build(
            Some(Box::new(move |msg: &mut Message| {
                dispatch_inner.dispatch(msg);
                true
            })),
            mode,
            routing_table_capacity,
        ));
        Self { inner, sink }
    }

    /// Entry point for producers.
    pub fn sink(&self) -> &Arc<MsgSink> {
        &self.sink
    }

    /// Shortcut for posting a copy of `msg` through the hub's sink.
    pub fn post(&self, msg: &Message) {
        self.sink.put_copy(msg);
    }

    /// Adds `sink` and replays the cached state to it.
    ///
    /// The replay reaches `sink` before any message dispatched after it joined.
    pub fn connect(&self, sink: &Arc<MsgSink>) {
        let link = {
            // Snapshot and registration under the state lock, so no state change
            // falls between them.
            let state = lock(&self.inner.state);
            let replay = state.replay();
            if !replay.is_empty() {
                debug!(
                    event = events::HUB_STATE_REPLAY,
                    component = COMPONENT,
                    sink_id = fields::format_optional_id(sink.id().as_deref()).as_str(),
                    num_msg = replay.len(),
                    "replaying cached state"
                );
            }
            let link = Arc::new(MemberLink {
                connected: AtomicBool::new(true),
                backlog: Mutex::new(Some(replay)),
            });

            let mut members = lock(&self.inner.members);
            members.retain(|member| member.sink.strong_count() > 0);
            members.push(Member {
                sink: Arc::downgrade(sink),
                link: link.clone(),
            });
            debug!(
                event = events::HUB_CONNECT,
                component = COMPONENT,
                sink_id = fields::format_optional_id(sink.id().as_deref()).as_str(),
                num_sinks = members.len(),
                "sink connected"
            );
            link
        };

        flush_backlog(sink, &link);

        if let Some(cb) = lock(&self.inner.connect_cb).as_ref() {
            cb(sink);
        }
    }

    /// Removes `sink`. Returns `false` if it was not connected.
    pub fn disconnect(&self, sink: &Arc<MsgSink>) -> bool {
        let mut members = lock(&self.inner.members);
        let target = Arc::downgrade(sink);
        match members.iter().position(|member| member.sink.ptr_eq(&target)) {
            Some(pos) => {
                let member = members.remove(pos);
                member.link.connected.store(false, Ordering::Release);
                debug!(
                    event = events::HUB_DISCONNECT,
                    component = COMPONENT,
                    sink_id = fields::format_optional_id(sink.id().as_deref()).as_str(),
                    num_sinks = members.len(),
                    "sink disconnected"
                );
                true
            }
            None => {
                warn!(
                    event = events::HUB_DISCONNECT_UNKNOWN,
                    component = COMPONENT,
                    sink_id = fields::format_optional_id(sink.id().as_deref()).as_str(),
                    "no such sink"
                );
                false
            }
        }
    }

    pub fn is_connected(&self, sink: &Arc<MsgSink>) -> bool {
        let target = Arc::downgrade(sink);
        lock(&self.inner.members)
            .iter()
            .any(|member| member.sink.ptr_eq(&target))
    }

    /// Number of live connected sinks.
    pub fn num_sinks(&self) -> usize {
        lock(&self.inner.members)
            .iter()
            .filter(|member| member.sink.strong_count() > 0)
            .count()
    }

    /// Registers a callback invoked with every newly connected sink.
    pub fn set_connect_callback<F>(&self, cb: F)
    where
        F: Fn(&Arc<MsgSink>) + Send + Sync + 'static,
    {
        *lock(&self.inner.connect_cb) = Some(Box::new(cb));
    }

    /// Last known value of every state variable seen by this hub.
    pub fn state(&self) -> StateSnapshot {
        lock(&self.inner.state).snapshot()
    }

    /// Broadcasts a message built separately for each connected sink.
    pub fn send_with<F>(&self, set_message: F)
    where
        F: Fn(&mut Message),
    {
        for (sink, link) in self.inner.members() {
            let mut msg = Message::default();
            set_message(&mut msg);
            deliver(&sink, &link, &msg);
        }
    }
}

impl HubInner {
    fn members(&self) -> Vec<(Arc<MsgSink>, Arc<MemberLink>)> {
        lock(&self.members)
            .iter()
            .filter_map(|member| Some((member.sink.upgrade()?, member.link.clone())))
            .collect()
    }

    fn dispatch(&self, msg: &Message) {
        if msg.is(ns::STATE, state::STATE_CHANGED) {
            lock(&self.state).update(msg);
        }

        let client_id = msg.client_id();

        for (sink, link) in self.members() {
            if !link.is_connected() {
                continue;
            }

            match client_id {
                None => deliver(&sink, &link, msg),
                Some(id) if sink.has_id(id) => {
                    trace!(
                        event = events::HUB_DELIVER_ADDRESSED,
                        component = COMPONENT,
                        client_id = id,
                        msg = fields::format_message(msg).as_str(),
                        "addressed delivery"
                    );
                    deliver(&sink, &link, msg);
                    return;
                }
                Some(_) => {}
            }
        }

        if let Some(id) = client_id {
            trace!(
                event = events::HUB_ADDRESSED_NO_MATCH,
                component = COMPONENT,
                client_id = id,
                msg = fields::format_message(msg).as_str(),
                "no sink claims client id"
            );
        }
    }
}

/// Hands `msg` to one member, or parks it behind a replay still in progress.
fn deliver(sink: &MsgSink, link: &MemberLink, msg: &Message) {
    {
        let mut backlog = lock(&link.backlog);
        if let Some(pending) = backlog.as_mut() {
            pending.push(msg.clone());
            return;
        }
    }
    sink.put_copy_if(msg, || link.is_connected());
}

/// Delivers the backlog of a fresh member until it runs dry, then switches the member
/// to direct delivery.
fn flush_backlog(sink: &MsgSink, link: &MemberLink) {
    loop {
        let pending = {
            let mut backlog = lock(&link.backlog);
            let pending = backlog.take().unwrap_or_default();
            if pending.is_empty() {
                return;
            }
            *backlog = Some(Vec::new());
            pending
        };
        for msg in &pending {
            sink.put_copy_if(msg, || link.is_connected());
        }
    }
}
