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

//! Bounded most-recently-used table of remote client ids seen by one sink.

use crate::observability::events;
use crate::sync_util::lock;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

pub const DEFAULT_ROUTING_TABLE_CAPACITY: usize = 32;
const COMPONENT: &str = "routing_table";

/// Routing table storage owner.
///
/// Entries are kept newest first. Inserting into a full table evicts the oldest entry,
/// so memory and echo-suppression lookback are both bounded by the capacity.
pub struct RoutingTable {
    capacity: usize,
    entries: Mutex<VecDeque<Uuid>>,
}

impl RoutingTable {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Returns `true` when `id` was recorded and not yet evicted.
    pub fn contains(&self, id: &str) -> bool {
        let Some(uuid) = Self::parse(id) else {
            return false;
        };
        lock(&self.entries).contains(&uuid)
    }

    /// Records `id` as the most recent entry. Re-inserting an id refreshes it.
    pub fn insert(&self, id: &str) {
        let Some(uuid) = Self::parse(id) else {
            return;
        };

        let mut entries = lock(&self.entries);
        if let Some(pos) = entries.iter().position(|entry| *entry == uuid) {
            entries.remove(pos);
        } else if entries.len() == self.capacity {
            if let Some(evicted) = entries.pop_back() {
                trace!(
                    event = events::ROUTING_TABLE_EVICT,
                    component = COMPONENT,
                    client_id = %evicted.hyphenated(),
                    "evicted oldest routing entry"
                );
            }
        }
        entries.push_front(uuid);
    }

    fn parse(id: &str) -> Option<Uuid> {
        match Uuid::parse_str(id) {
            Ok(uuid) => Some(uuid),
            Err(err) => {
                debug!(
                    event = events::ROUTING_TABLE_INVALID_ID,
                    component = COMPONENT,
                    client_id = id,
                    err = %err,
                    "ignoring non-uuid client id"
                );
                None
            }
        }
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new(DEFAULT_ROUTING_TABLE_CAPACITY)
    }
}
