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


use msg_router::{Message, MsgHandler};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared record of messages seen by a [`recording_handler`].
#[derive(Clone, Default)]
pub struct MessageLog {
    messages: Arc<Mutex<Vec<Message>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, msg: &Message) {
        self.lock().push(msg.clone());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().clone()
    }

    /// `(ns, id)` of every recorded message, oldest first.
    pub fn ids(&self) -> Vec<(u32, u32)> {
        self.lock().iter().map(|msg| (msg.ns(), msg.id())).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handler appending every message to `log` and continuing the drain.
pub fn recording_handler(log: &MessageLog) -> impl MsgHandler + 'static {
    let log = log.clone();
    move |msg: &mut Message| {
        log.push(msg);
        true
    }
}
