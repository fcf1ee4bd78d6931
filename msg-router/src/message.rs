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

//! Self-describing message unit passed between sinks.

use crate::error::RouterError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Well-known namespaces.
pub mod ns {
    pub const GENERIC: u32 = 1;
    pub const STATE: u32 = 2;
    pub const PLAYER: u32 = 3;
    pub const DB: u32 = 4;
}

/// Ids within [`ns::GENERIC`].
pub mod generic {
    pub const CMD_QUIT: u32 = 1;
}

/// Ids within [`ns::STATE`].
pub mod state {
    pub const STATE_CHANGED: u32 = 1;
    pub const CMD_SET_STATE: u32 = 100;
    pub const CMD_SET_STATE_REL: u32 = 101;
}

pub const HEADER_CLIENT_ID: &str = "client_id";
pub const HEADER_FUNCTION_TAG: &str = "function_tag";
pub const HEADER_LAST: &str = "last";

/// Typed argument or header value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "v", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Empty,
    Int(i32),
    Long(i64),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
    Array(Vec<Value>),
    Dictionary(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    fn same_type(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Adds a relative delta of the same numeric type. Returns `false` for other types.
    pub fn add_delta(&mut self, delta: &Value) -> bool {
        match (self, delta) {
            (Value::Int(v), Value::Int(d)) => *v = v.wrapping_add(*d),
            (Value::Long(v), Value::Long(d)) => *v = v.wrapping_add(*d),
            (Value::Float(v), Value::Float(d)) => *v += *d,
            _ => return false,
        }
        true
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Int(i32::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

/// One command or event.
///
/// The client id travels in the header and is never rewritten by a hop that finds it
/// already set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    ns: u32,
    id: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    header: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<Value>,
}

impl Message {
    pub fn new(ns: u32, id: u32) -> Self {
        Self {
            ns,
            id,
            ..Default::default()
        }
    }

    /// Generic quit command. Stops a sink drain when encountered.
    pub fn quit() -> Self {
        Self::new(ns::GENERIC, generic::CMD_QUIT)
    }

    pub fn state_changed(last: bool, ctx: &str, var: &str, value: impl Into<Value>) -> Self {
        Self::state_message(state::STATE_CHANGED, last, ctx, var, value.into())
    }

    pub fn set_state(last: bool, ctx: &str, var: &str, value: impl Into<Value>) -> Self {
        Self::state_message(state::CMD_SET_STATE, last, ctx, var, value.into())
    }

    pub fn set_state_rel(last: bool, ctx: &str, var: &str, delta: impl Into<Value>) -> Self {
        Self::state_message(state::CMD_SET_STATE_REL, last, ctx, var, delta.into())
    }

    fn state_message(id: u32, last: bool, ctx: &str, var: &str, value: Value) -> Self {
        let mut msg = Self::new(ns::STATE, id);
        msg.args = vec![last.into(), ctx.into(), var.into(), value];
        msg
    }

    pub fn ns(&self) -> u32 {
        self.ns
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn set_ns_id(&mut self, ns: u32, id: u32) {
        self.ns = ns;
        self.id = id;
    }

    pub fn is(&self, ns: u32, id: u32) -> bool {
        self.ns == ns && self.id == id
    }

    pub fn is_quit(&self) -> bool {
        self.is(ns::GENERIC, generic::CMD_QUIT)
    }

    pub fn client_id(&self) -> Option<&str> {
        self.header.get(HEADER_CLIENT_ID).and_then(Value::as_str)
    }

    pub fn set_client_id(&mut self, client_id: &str) {
        self.header
            .insert(HEADER_CLIENT_ID.to_string(), client_id.into());
    }

    pub fn clear_client_id(&mut self) {
        self.header.remove(HEADER_CLIENT_ID);
    }

    pub fn function_tag(&self) -> Option<&str> {
        self.header.get(HEADER_FUNCTION_TAG).and_then(Value::as_str)
    }

    pub fn set_function_tag(&mut self, tag: &str) {
        self.header
            .insert(HEADER_FUNCTION_TAG.to_string(), tag.into());
    }

    /// Tags the message with a fresh function tag unless it already carries one.
    pub fn add_function_tag(&mut self) -> &str {
        self.header
            .entry(HEADER_FUNCTION_TAG.to_string())
            .or_insert_with(|| Value::String(Uuid::new_v4().hyphenated().to_string()))
            .as_str()
            .unwrap_or_default()
    }

    /// Marks the final reply of a function call.
    pub fn is_last(&self) -> bool {
        self.header
            .get(HEADER_LAST)
            .and_then(Value::as_int)
            .is_some_and(|v| v != 0)
    }

    pub fn set_last(&mut self, last: bool) {
        self.header.insert(HEADER_LAST.to_string(), last.into());
    }

    pub fn header(&self) -> &BTreeMap<String, Value> {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.header
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn arg(&self, idx: usize) -> Option<&Value> {
        self.args.get(idx)
    }

    pub fn push_arg(&mut self, value: impl Into<Value>) {
        self.args.push(value.into());
    }

    /// Sets argument `idx`, padding with [`Value::Empty`] if needed.
    pub fn set_arg(&mut self, idx: usize, value: impl Into<Value>) {
        if self.args.len() <= idx {
            self.args.resize(idx + 1, Value::Empty);
        }
        self.args[idx] = value.into();
    }

    /// Copies `other` into `self`, reusing the existing allocations.
    pub fn copy_from(&mut self, other: &Message) {
        self.ns = other.ns;
        self.id = other.id;
        self.header.clone_from(&other.header);
        self.args.clone_from(&other.args);
    }

    /// Clears content so the slot can be handed out again.
    pub(crate) fn reset(&mut self) {
        self.ns = 0;
        self.id = 0;
        self.header.clear();
        self.args.clear();
    }

    /// Splits a state message into `(last, ctx, var, value)`.
    pub fn state_parts(&self) -> Option<(bool, &str, &str, &Value)> {
        if self.ns != ns::STATE {
            return None;
        }
        let last = self.arg(0)?.as_int()? != 0;
        let ctx = self.arg(1)?.as_str()?;
        let var = self.arg(2)?.as_str()?;
        let value = self.arg(3)?;
        Some((last, ctx, var, value))
    }

    /// Folds `next` into `self` when both address the same state variable.
    ///
    /// Absolute sets keep the newer value, relative sets accumulate their deltas.
    /// Returns `true` when `next` is fully absorbed and can be dropped.
    pub fn merge(&mut self, next: &Message) -> bool {
        if self.ns != next.ns || self.id != next.id || self.ns != ns::STATE {
            return false;
        }
        if self.id != state::CMD_SET_STATE && self.id != state::CMD_SET_STATE_REL {
            return false;
        }
        if self.client_id() != next.client_id() || self.function_tag() != next.function_tag() {
            return false;
        }

        let same_target = match (self.state_parts(), next.state_parts()) {
            (Some((_, ctx, var, value)), Some((_, next_ctx, next_var, next_value))) => {
                ctx == next_ctx && var == next_var && value.same_type(next_value)
            }
            _ => false,
        };
        if !same_target {
            return false;
        }

        if self.id == state::CMD_SET_STATE {
            self.args[3].clone_from(&next.args[3]);
            true
        } else {
            self.args[3].add_delta(&next.args[3])
        }
    }

    pub fn to_json(&self) -> Result<String, RouterError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RouterError> {
        Ok(serde_json::from_str(json)?)
    }
}
