//! Structured logging vocabulary.
//!
//! Library code only emits `tracing` events; subscriber setup belongs to binaries and tests.

pub mod events;
pub mod fields;
