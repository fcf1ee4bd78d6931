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

//! Canonical structured field values and value-format helpers.

use crate::message::Message;

pub const NONE: &str = "none";
pub const REASON_NO_UPSTREAM: &str = "no_upstream";
pub const REASON_UPSTREAM_DROPPED: &str = "upstream_dropped";
pub const REASON_INVALID_THREAD_NAME: &str = "invalid_thread_name";
pub const REASON_STOP_REQUESTED: &str = "stop_requested";
pub const DEFAULT_PUMP_THREAD: &str = "unknown-thread";

pub fn thread_name_or_default(thread_name: Option<&str>) -> String {
    thread_name.unwrap_or(DEFAULT_PUMP_THREAD).to_string()
}

pub fn current_thread_name_or_default() -> String {
    thread_name_or_default(std::thread::current().name())
}

/// Renders a message as `ns:id` for log correlation.
pub fn format_message(message: &Message) -> String {
    format!("{}:{}", message.ns(), message.id())
}

pub fn format_client_id(message: &Message) -> String {
    format_optional_id(message.client_id())
}

pub fn format_optional_id(id: Option<&str>) -> String {
    id.unwrap_or(NONE).to_string()
}
