//! Flutter-facing bindings for CloudNote core.

pub mod api;
