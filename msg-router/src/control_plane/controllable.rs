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

//! Entity side of the control plane: a command sink served by the entity and an event
//! hub fanning its notifications out to every connected control.

use crate::config::RouterConfig;
use crate::control_plane::control::Control;
use crate::data_plane::hub::MsgHub;
use crate::data_plane::sink::{MsgSink, SinkMode};
use crate::error::RouterError;
use crate::message::Message;
use crate::observability::{events, fields};
use crate::sync_util::{lock, read, write};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error};

const COMPONENT: &str = "controllable";

type PingFn = Arc<dyn Fn() + Send + Sync>;

pub struct Controllable {
    cmd_sink: Arc<MsgSink>,
    evt_hub: MsgHub,
    config: RouterConfig,
    ping: RwLock<Option<PingFn>>,
    cleanup: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Controllable {
    pub fn new(cmd_sink: Arc<MsgSink>, evt_hub: MsgHub) -> Arc<Self> {
        Self::with_config(cmd_sink, evt_hub, RouterConfig::default())
    }

    pub(crate) fn with_config(
        cmd_sink: Arc<MsgSink>,
        evt_hub: MsgHub,
        config: RouterConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            cmd_sink,
            evt_hub,
            config,
            ping: RwLock::new(None),
            cleanup: Mutex::new(None),
        })
    }

    pub fn cmd_sink(&self) -> &Arc<MsgSink> {
        &self.cmd_sink
    }

    pub fn evt_hub(&self) -> &MsgHub {
        &self.evt_hub
    }

    /// Where the entity posts its events.
    pub fn evt_sink(&self) -> &Arc<MsgSink> {
        self.evt_hub.sink()
    }

    /// Attaches `control`: its event sink joins the hub and its commands flow here.
    pub fn connect(self: &Arc<Self>, control: &Control) {
        self.evt_hub.connect(control.evt_sink());
        control.set_upstream(Arc::downgrade(self));
        debug!(
            event = events::CONTROLLABLE_CONNECT,
            component = COMPONENT,
            control_id = control.id(),
            "control connected"
        );
    }

    pub fn disconnect(&self, control: &Control) {
        if self.evt_hub.is_connected(control.evt_sink()) {
            self.evt_hub.disconnect(control.evt_sink());
        }
        control.clear_upstream();
        debug!(
            event = events::CONTROLLABLE_DISCONNECT,
            component = COMPONENT,
            control_id = control.id(),
            "control disconnected"
        );
    }

    /// Registers private cleanup run when the controllable is dropped.
    pub fn set_cleanup<F>(&self, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *lock(&self.cleanup) = Some(Box::new(cleanup));
    }

    /// Registers a hook run on every poll of [`Controllable::call_function`].
    ///
    /// Lets an entity without its own pump serve its command sink while a caller waits.
    pub fn set_ping<F>(&self, ping: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *write(&self.ping) = Some(Arc::new(ping));
    }

    /// Sends `func` as a function call and waits for its replies.
    ///
    /// Every event carrying the same function tag is passed to `on_reply`. The call
    /// completes with the reply flagged as last, or fails once `timeout` has elapsed.
    /// The command sink must be served while this blocks: synchronously, by another
    /// thread pumping it, or from the hook set with [`Controllable::set_ping`].
    pub fn call_function<F>(
        self: &Arc<Self>,
        func: &mut Message,
        on_reply: F,
        timeout: Duration,
    ) -> Result<(), RouterError>
    where
        F: FnMut(&Message) + Send + 'static,
    {
        let reply_tag = func.add_function_tag().to_string();
        let on_reply = Mutex::new(on_reply);

        let evt_sink = Arc::new(MsgSink::build(
            Some(Box::new(move |msg: &mut Message| {
                if msg.function_tag() != Some(reply_tag.as_str()) {
                    return true;
                }
                let mut on_reply = lock(&on_reply);
                (*on_reply)(msg);
                !msg.is_last()
            })),
            SinkMode::Buffered,
            self.config.routing_table_capacity,
        ));
        let control = Control::build(evt_sink, None, self.config.routing_table_capacity);

        debug!(
            event = events::FUNCTION_CALL_START,
            component = COMPONENT,
            control_id = control.id(),
            msg = fields::format_message(func).as_str(),
            "calling function"
        );

        self.connect(&control);
        control.cmd_sink().put_copy(func);

        let started = Instant::now();
        let result = loop {
            let ping = read(&self.ping).clone();
            if let Some(ping) = ping {
                ping();
            }
            if !control.evt_sink().iteration() {
                debug!(
                    event = events::FUNCTION_CALL_OK,
                    component = COMPONENT,
                    control_id = control.id(),
                    "function call finished"
                );
                break Ok(());
            }
            if started.elapsed() > timeout {
                error!(
                    event = events::FUNCTION_CALL_TIMEOUT,
                    component = COMPONENT,
                    control_id = control.id(),
                    "timeout expired when waiting for function result"
                );
                break Err(RouterError::Timeout(timeout));
            }
            thread::sleep(self.config.function_poll_interval());
        };

        self.disconnect(&control);
        result
    }
}

impl Drop for Controllable {
    fn drop(&mut self) {
        let cleanup = lock(&self.cleanup).take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Controllable;
    use crate::control_plane::control::Control;
    use crate::data_plane::hub::MsgHub;
    use crate::data_plane::sink::{MsgSink, SinkMode};
    use crate::error::RouterError;
    use crate::message::{ns, Message, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Entity answering each command with `replies` events addressed to the caller.
    fn replying_entity(replies: usize) -> Arc<Controllable> {
        let evt_hub = MsgHub::new(SinkMode::Synchronous);
        let evt_sink = evt_hub.sink().clone();
        let cmd_sink = MsgSink::new(
            move |cmd: &mut Message| {
                for n in 0..replies {
                    let mut reply = Message::new(ns::PLAYER, 200);
                    if let Some(tag) = cmd.function_tag() {
                        reply.set_function_tag(tag);
                    }
                    if let Some(client_id) = cmd.client_id() {
                        reply.set_client_id(client_id);
                    }
                    reply.push_arg(n as i32);
                    reply.set_last(n + 1 == replies);
                    evt_sink.put_copy(&reply);
                }
                true
            },
            SinkMode::Synchronous,
        );
        Controllable::new(cmd_sink, evt_hub)
    }

    #[test]
    fn call_function_collects_replies_until_last() {
        let entity = replying_entity(3);
        let replies = Arc::new(Mutex::new(Vec::new()));
        let replies_clone = replies.clone();

        let mut func = Message::new(ns::PLAYER, 100);
        entity
            .call_function(
                &mut func,
                move |reply| {
                    replies_clone.lock().unwrap().push(reply.arg(0).cloned());
                },
                Duration::from_secs(2),
            )
            .expect("function call should complete");

        assert!(func.function_tag().is_some());
        assert_eq!(
            *replies.lock().unwrap(),
            vec![Some(Value::Int(0)), Some(Value::Int(1)), Some(Value::Int(2))]
        );
        assert_eq!(entity.evt_hub().num_sinks(), 0);
    }

    #[test]
    fn call_function_times_out_without_last_reply() {
        let entity = replying_entity(0);

        let result = entity.call_function(
            &mut Message::new(ns::PLAYER, 100),
            |_reply| {},
            Duration::from_millis(50),
        );

        assert!(matches!(result, Err(RouterError::Timeout(_))));
        assert_eq!(entity.evt_hub().num_sinks(), 0);
    }

    #[test]
    fn connect_and_disconnect_manage_hub_membership() {
        let entity = replying_entity(1);
        let control = Control::new(MsgSink::detached());

        entity.connect(&control);
        assert!(control.is_attached());
        assert!(entity.evt_hub().is_connected(control.evt_sink()));

        entity.disconnect(&control);
        assert!(!control.is_attached());
        assert!(!entity.evt_hub().is_connected(control.evt_sink()));
    }

    #[test]
    fn cleanup_runs_on_drop() {
        let entity = replying_entity(1);
        let cleaned = Arc::new(AtomicUsize::new(0));
        let cleaned_clone = cleaned.clone();
        entity.set_cleanup(move || {
            cleaned_clone.fetch_add(1, Ordering::SeqCst);
        });

        drop(entity);

        assert_eq!(cleaned.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ping_serves_unpumped_buffered_entity() {
        let evt_hub = MsgHub::new(SinkMode::Synchronous);
        let evt_sink = evt_hub.sink().clone();
        let cmd_sink = MsgSink::new(
            move |cmd: &mut Message| {
                let mut reply = Message::new(ns::PLAYER, 200);
                if let Some(tag) = cmd.function_tag() {
                    reply.set_function_tag(tag);
                }
                if let Some(client_id) = cmd.client_id() {
                    reply.set_client_id(client_id);
                }
                reply.set_last(true);
                evt_sink.put_copy(&reply);
                true
            },
            SinkMode::Buffered,
        );
        let entity = Controllable::new(cmd_sink.clone(), evt_hub);
        let pings = Arc::new(AtomicUsize::new(0));
        let pings_clone = pings.clone();
        entity.set_ping(move || {
            pings_clone.fetch_add(1, Ordering::SeqCst);
            cmd_sink.iteration();
        });

        let replies = Arc::new(AtomicUsize::new(0));
        let replies_clone = replies.clone();
        entity
            .call_function(
                &mut Message::new(ns::PLAYER, 100),
                move |_reply| {
                    replies_clone.fetch_add(1, Ordering::SeqCst);
                },
                Duration::from_secs(2),
            )
            .expect("ping should serve the command");

        assert_eq!(replies.load(Ordering::SeqCst), 1);
        assert!(pings.load(Ordering::SeqCst) >= 1);
    }
}
