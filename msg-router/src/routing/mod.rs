//! Routing layer.
//!
//! Owns the per-sink routing table that drives addressed delivery and the hub state
//! cache replayed to newly connected sinks.

pub(crate) mod routing_table;
pub(crate) mod state_cache;
