//! Control-plane layer.
//!
//! Pairs command and event sinks into controllable entities and client controls, and
//! chains controllables through bridges. Echo suppression is purely local: each control
//! stamps or records client ids as commands pass through it.

pub(crate) mod bridge;
pub(crate) mod control;
pub(crate) mod controllable;
