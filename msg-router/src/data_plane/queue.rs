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

//! FIFO of pending messages with a recycling pool of free slots.

use crate::message::Message;
use crate::observability::{events, fields};
use crate::sync_util::lock;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::info;

const COMPONENT: &str = "msg_queue";

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Message>,
    pool: Vec<Message>,
}

/// Message queue owning every slot it hands out.
///
/// Slots come from [`MsgQueue::acquire`] and go back through [`MsgQueue::recycle`], so
/// steady-state traffic does not allocate. Readers may poll ([`MsgQueue::try_pop`]) or
/// block until a producer pushes ([`MsgQueue::pop_blocking`]).
#[derive(Default)]
pub struct MsgQueue {
    state: Mutex<QueueState>,
    produced: Condvar,
}

impl MsgQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out an empty slot, reusing a pooled one when available.
    pub fn acquire(&self) -> Message {
        match lock(&self.state).pool.pop() {
            Some(mut msg) => {
                msg.reset();
                msg
            }
            None => Message::default(),
        }
    }

    /// Appends `msg`, folding it into the newest pending message when the two merge.
    ///
    /// Returns `true` if the message was merged instead of queued.
    pub fn push(&self, msg: Message) -> bool {
        let mut state = lock(&self.state);
        let merged = state
            .pending
            .back_mut()
            .is_some_and(|last| last.merge(&msg));

        if merged {
            info!(
                event = events::SINK_QUEUE_MERGED,
                component = COMPONENT,
                msg = fields::format_message(&msg).as_str(),
                "merged messages"
            );
            state.pool.push(msg);
        } else {
            state.pending.push_back(msg);
            self.produced.notify_one();
        }
        merged
    }

    pub fn try_pop(&self) -> Option<Message> {
        lock(&self.state).pending.pop_front()
    }

    /// Blocks until a message is available.
    pub fn pop_blocking(&self) -> Message {
        let mut state = lock(&self.state);
        loop {
            if let Some(msg) = state.pending.pop_front() {
                return msg;
            }
            state = self
                .produced
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until a message is available or `timeout` elapses.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Message> {
        let deadline = Instant::now() + timeout;
        let mut state = lock(&self.state);
        loop {
            if let Some(msg) = state.pending.pop_front() {
                return Some(msg);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            state = self
                .produced
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Namespace and id of the head message, without removing it.
    pub fn peek(&self) -> Option<(u32, u32)> {
        lock(&self.state)
            .pending
            .front()
            .map(|msg| (msg.ns(), msg.id()))
    }

    /// Returns a consumed slot to the pool.
    pub fn recycle(&self, msg: Message) {
        lock(&self.state).pool.push(msg);
    }

    pub fn len(&self) -> usize {
        lock(&self.state).pending.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).pending.is_empty()
    }

    pub fn pooled(&self) -> usize {
        lock(&self.state).pool.len()
    }
}
