//! Runtime layer.
//!
//! Thread boundaries for sinks drained by a dedicated event loop instead of their owner.

pub(crate) mod pump_runtime;
