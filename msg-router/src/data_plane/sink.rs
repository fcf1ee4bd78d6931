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

//! Addressable message sink.
//!
//! A sink is the single point through which all traffic for one logical entity passes.
//! Producers acquire a slot with [`MsgSink::get`], fill it and publish it with
//! [`MsgWriteGuard::put`]. Synchronous sinks run their handler inside `put`; buffered
//! sinks queue the message until [`MsgSink::iteration`] drains it.

use crate::data_plane::queue::MsgQueue;
use crate::error::RouterError;
use crate::message::Message;
use crate::observability::{events, fields};
use crate::routing::routing_table::{RoutingTable, DEFAULT_ROUTING_TABLE_CAPACITY};
use crate::sync_util::{lock, read, write};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tracing::{debug, trace, warn};

const COMPONENT: &str = "msg_sink";

/// Sink id accepting every client id.
pub const WILDCARD_ID: &str = "*";

/// Consumer of messages delivered by a sink.
///
/// Returning `false` stops the current drain cycle after this message.
pub trait MsgHandler: Send + Sync {
    fn handle(&self, msg: &mut Message) -> bool;
}

impl<F> MsgHandler for F
where
    F: Fn(&mut Message) -> bool + Send + Sync,
{
    fn handle(&self, msg: &mut Message) -> bool {
        self(msg)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SinkMode {
    /// Handler runs on the producer thread inside `put`.
    Synchronous,
    /// Messages are queued until the owner drains the sink.
    Buffered,
}

pub struct MsgSink {
    id: RwLock<Option<String>>,
    handler: Option<Box<dyn MsgHandler>>,
    queue: Option<MsgQueue>,
    // Serializes producers. Holds the reusable slot of a synchronous sink.
    write_slot: Mutex<Option<Message>>,
    routing_table: RoutingTable,
    num_msg: AtomicUsize,
    cleanup: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl MsgSink {
    pub fn new<H>(handler: H, mode: SinkMode) -> Arc<Self>
    where
        H: MsgHandler + 'static,
    {
        Arc::new(Self::build(
            Some(Box::new(handler)),
            mode,
            DEFAULT_ROUTING_TABLE_CAPACITY,
        ))
    }

    /// Buffered sink without a handler, read through [`MsgSink::get_read`].
    pub fn detached() -> Arc<Self> {
        Arc::new(Self::build(
            None,
            SinkMode::Buffered,
            DEFAULT_ROUTING_TABLE_CAPACITY,
        ))
    }

    pub(crate) fn build(
        handler: Option<Box<dyn MsgHandler>>,
        mode: SinkMode,
        routing_table_capacity: usize,
    ) -> Self {
        Self {
            id: RwLock::new(None),
            handler,
            queue: (mode == SinkMode::Buffered).then(MsgQueue::new),
            write_slot: Mutex::new(None),
            routing_table: RoutingTable::new(routing_table_capacity),
            num_msg: AtomicUsize::new(0),
            cleanup: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> SinkMode {
        if self.queue.is_some() {
            SinkMode::Buffered
        } else {
            SinkMode::Synchronous
        }
    }

    pub fn id(&self) -> Option<String> {
        read(&self.id).clone()
    }

    pub fn set_id(&self, id: &str) {
        *write(&self.id) = Some(id.to_string());
    }

    /// Whether a message addressed to `client_id` belongs to this sink: its own id, the
    /// wildcard id, or an id recorded in the routing table.
    pub fn has_id(&self, client_id: &str) -> bool {
        if let Some(own) = read(&self.id).as_deref() {
            if own == client_id || own == WILDCARD_ID {
                return true;
            }
        }
        self.routing_table.contains(client_id)
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    /// Number of messages consumed by the last [`MsgSink::iteration`].
    pub fn num_msg(&self) -> usize {
        self.num_msg.load(Ordering::Acquire)
    }

    /// Number of queued messages. Always zero for synchronous sinks.
    pub fn pending(&self) -> usize {
        self.queue.as_ref().map_or(0, MsgQueue::len)
    }

    /// Registers a closure run once when the sink is dropped.
    pub fn set_cleanup<F>(&self, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *lock(&self.cleanup) = Some(Box::new(cleanup));
    }

    /// Acquires the write slot. Blocks while another producer holds it.
    pub fn get(&self) -> MsgWriteGuard<'_> {
        let mut slot = lock(&self.write_slot);
        let msg = match &self.queue {
            Some(queue) => queue.acquire(),
            None => {
                let mut msg = slot.take().unwrap_or_default();
                msg.reset();
                msg
            }
        };
        MsgWriteGuard {
            sink: self,
            slot,
            msg: Some(msg),
        }
    }

    /// Publishes a copy of `msg`.
    pub fn put_copy(&self, msg: &Message) {
        let mut slot = self.get();
        slot.copy_from(msg);
        slot.put();
    }

    /// Publishes a copy of `msg` if `admit` still holds once the write slot is acquired.
    ///
    /// `admit` runs while the slot is held, so a condition revoked by another thread
    /// before this call returns from [`MsgSink::get`] is always observed.
    pub(crate) fn put_copy_if<F>(&self, msg: &Message, admit: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let mut slot = self.get();
        if !admit() {
            return false;
        }
        slot.copy_from(msg);
        slot.put();
        true
    }

    fn publish(&self, mut msg: Message, slot: &mut Option<Message>) {
        match &self.queue {
            Some(queue) => {
                queue.push(msg);
            }
            None => {
                if let Some(handler) = &self.handler {
                    handler.handle(&mut msg);
                }
                *slot = Some(msg);
            }
        }
    }

    fn discard(&self, msg: Message, slot: &mut Option<Message>) {
        match &self.queue {
            Some(queue) => queue.recycle(msg),
            None => *slot = Some(msg),
        }
    }

    /// Drains every queued message through the handler in FIFO order without blocking.
    ///
    /// Returns `false` when a quit command was consumed or the handler asked to stop.
    /// Synchronous sinks have nothing to drain and always return `true`.
    pub fn iteration(&self) -> bool {
        self.num_msg.store(0, Ordering::Release);

        let Some(queue) = &self.queue else {
            return true;
        };

        let mut consumed = 0;
        let mut result = true;

        while let Some(mut msg) = queue.try_pop() {
            consumed += 1;

            if msg.is_quit() {
                debug!(
                    event = events::SINK_QUIT_RECEIVED,
                    component = COMPONENT,
                    sink_id = fields::format_optional_id(self.id().as_deref()).as_str(),
                    "got quit command"
                );
                queue.recycle(msg);
                result = false;
                break;
            }

            if let Some(handler) = &self.handler {
                result = handler.handle(&mut msg);
            }
            queue.recycle(msg);

            if !result {
                break;
            }
        }

        self.num_msg.store(consumed, Ordering::Release);
        trace!(
            event = events::SINK_DRAIN_DONE,
            component = COMPONENT,
            num_msg = consumed,
            "drain cycle done"
        );
        result
    }

    /// Pops the oldest queued message for manual processing.
    ///
    /// The slot must be handed back with [`MsgSink::done_read`].
    pub fn get_read(&self) -> Result<Option<Message>, RouterError> {
        Ok(self.read_queue()?.try_pop())
    }

    /// Like [`MsgSink::get_read`] but waits up to `timeout` for a producer.
    pub fn wait_read(&self, timeout: Duration) -> Result<Option<Message>, RouterError> {
        Ok(self.read_queue()?.pop_timeout(timeout))
    }

    pub fn done_read(&self, msg: Message) {
        if let Some(queue) = &self.queue {
            queue.recycle(msg);
        }
    }

    fn read_queue(&self) -> Result<&MsgQueue, RouterError> {
        self.queue.as_ref().ok_or_else(|| {
            warn!(
                event = events::SINK_READ_ON_SYNCHRONOUS,
                component = COMPONENT,
                sink_id = fields::format_optional_id(self.id().as_deref()).as_str(),
                "read-side access on synchronous sink"
            );
            RouterError::SynchronousSink
        })
    }
}

impl Drop for MsgSink {
    fn drop(&mut self) {
        let cleanup = lock(&self.cleanup).take();
        if let Some(cleanup) = cleanup {
            trace!(event = events::SINK_CLEANUP, component = COMPONENT, "running cleanup");
            cleanup();
        }
    }
}

impl fmt::Debug for MsgSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MsgSink")
            .field("id", &self.id())
            .field("mode", &self.mode())
            .field("pending", &self.pending())
            .finish()
    }
}

/// Exclusive access to a sink's write slot.
///
/// Publishing happens in [`MsgWriteGuard::put`]. Dropping the guard without calling
/// `put` returns the slot unpublished.
pub struct MsgWriteGuard<'a> {
    sink: &'a MsgSink,
    slot: MutexGuard<'a, Option<Message>>,
    msg: Option<Message>,
}

impl MsgWriteGuard<'_> {
    /// Makes the message visible and releases the write lock.
    pub fn put(mut self) {
        if let Some(msg) = self.msg.take() {
            self.sink.publish(msg, &mut self.slot);
        }
    }
}

impl Deref for MsgWriteGuard<'_> {
    type Target = Message;

    fn deref(&self) -> &Message {
        // Only `put` and `drop` take the message, both consume the guard.
        self.msg.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for MsgWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut Message {
        self.msg.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for MsgWriteGuard<'_> {
    fn drop(&mut self) {
        if let Some(msg) = self.msg.take() {
            self.sink.discard(msg, &mut self.slot);
        }
    }
}
