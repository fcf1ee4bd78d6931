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

//! Dedicated pump threads draining buffered sinks.

use crate::data_plane::sink::MsgSink;
use crate::error::RouterError;
use crate::observability::{events, fields};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::runtime::Builder;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub(crate) const DEFAULT_PUMP_RUNTIME_THREAD_NAME: &str = "msg-router-pump";
const PUMP_RUNTIME_THREAD_NAME_PREFIX: &str = "mr-pump-";
const PUMP_RUNTIME_THREAD_NAME_MAX_LEN: usize = 15;
const COMPONENT: &str = "pump_runtime";

/// Owner of one pump thread.
///
/// Stopping is cooperative: the flag is checked once per interval.
pub struct PumpHandle {
    stop: Arc<AtomicBool>,
    pump_thread: String,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl PumpHandle {
    pub fn pump_thread(&self) -> &str {
        &self.pump_thread
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map_or(true, thread::JoinHandle::is_finished)
    }

    /// Requests the pump to stop and waits for its thread.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(join_handle) = self.join_handle.take() {
            if join_handle.join().is_err() {
                warn!(
                    event = events::PUMP_STOPPED,
                    component = COMPONENT,
                    pump_thread = self.pump_thread.as_str(),
                    "pump thread panicked"
                );
            }
        }
    }
}

impl Drop for PumpHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

/// Starts a thread calling [`MsgSink::iteration`] on `sink` every `period` until the
/// sink consumes a quit command, its handler asks to stop, or the handle is stopped.
pub fn spawn_pump(
    name: &str,
    sink: Arc<MsgSink>,
    period: Duration,
) -> Result<PumpHandle, RouterError> {
    let pump_thread = build_pump_thread_name(name);
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    debug!(
        event = events::PUMP_SPAWN_START,
        component = COMPONENT,
        pump_thread = pump_thread.as_str(),
        "spawning pump thread"
    );

    let join_handle = thread::Builder::new()
        .name(pump_thread.clone())
        .spawn(move || {
            let runtime = match Builder::new_current_thread().enable_time().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!(
                        event = events::PUMP_RUNTIME_FAILED,
                        component = COMPONENT,
                        pump_thread = fields::current_thread_name_or_default().as_str(),
                        err = %err,
                        "failed to create pump runtime"
                    );
                    return;
                }
            };
            runtime.block_on(pump_loop(sink, period, stop_flag));
        })
        .map_err(|err| {
            error!(
                event = events::PUMP_SPAWN_FAILED,
                component = COMPONENT,
                pump_thread = pump_thread.as_str(),
                err = %err,
                "failed to spawn pump thread"
            );
            RouterError::Io(err)
        })?;

    info!(
        event = events::PUMP_SPAWN_OK,
        component = COMPONENT,
        pump_thread = pump_thread.as_str(),
        "pump thread running"
    );

    Ok(PumpHandle {
        stop,
        pump_thread,
        join_handle: Some(join_handle),
    })
}

async fn pump_loop(sink: Arc<MsgSink>, period: Duration, stop: Arc<AtomicBool>) {
    let pump_thread = fields::current_thread_name_or_default();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if stop.load(Ordering::Acquire) {
            info!(
                event = events::PUMP_STOPPED,
                component = COMPONENT,
                pump_thread = pump_thread.as_str(),
                reason = fields::REASON_STOP_REQUESTED,
                "pump stopped"
            );
            break;
        }

        if !sink.iteration() {
            info!(
                event = events::PUMP_QUIT,
                component = COMPONENT,
                pump_thread = pump_thread.as_str(),
                num_msg = sink.num_msg(),
                "sink requested stop"
            );
            break;
        }
    }
}

fn build_pump_thread_name(name: &str) -> String {
    let suffix_len = PUMP_RUNTIME_THREAD_NAME_MAX_LEN - PUMP_RUNTIME_THREAD_NAME_PREFIX.len();
    let suffix: String = name
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-')
        .take(suffix_len)
        .collect();

    if suffix.is_empty() {
        debug!(
            event = events::PUMP_THREAD_NAME_FALLBACK,
            component = COMPONENT,
            reason = fields::REASON_INVALID_THREAD_NAME,
            "using default pump thread name"
        );
        DEFAULT_PUMP_RUNTIME_THREAD_NAME.to_string()
    } else {
        format!("{PUMP_RUNTIME_THREAD_NAME_PREFIX}{suffix}")
    }
}
