//! Data-plane layer.
//!
//! Message storage and delivery: the recycling queue, the addressable sink and the
//! fan-out hub built on top of it.

pub(crate) mod hub;
pub(crate) mod queue;
pub(crate) mod sink;
