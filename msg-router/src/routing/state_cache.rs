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

//! Last-known state mirrored by a hub so late joiners can catch up.

use crate::message::{state, Message, Value};
use std::collections::BTreeMap;

pub type StateSnapshot = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Debug, Default)]
pub(crate) struct StateCache {
    contexts: StateSnapshot,
}

impl StateCache {
    /// Records a state-changed event. Other messages are ignored.
    pub(crate) fn update(&mut self, msg: &Message) -> bool {
        if msg.id() != state::STATE_CHANGED {
            return false;
        }
        let Some((_, ctx, var, value)) = msg.state_parts() else {
            return false;
        };
        self.contexts
            .entry(ctx.to_string())
            .or_default()
            .insert(var.to_string(), value.clone());
        true
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub(crate) fn snapshot(&self) -> StateSnapshot {
        self.contexts.clone()
    }

    /// Builds one state-changed message per cached variable. The final message of each
    /// context carries the `last` flag.
    pub(crate) fn replay(&self) -> Vec<Message> {
        let mut messages = Vec::new();
        for (ctx, vars) in &self.contexts {
            let count = vars.len();
            for (idx, (var, value)) in vars.iter().enumerate() {
                messages.push(Message::state_changed(
                    idx + 1 == count,
                    ctx,
                    var,
                    value.clone(),
                ));
            }
        }
        messages
    }
}
