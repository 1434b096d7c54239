//! Application command/query handlers, one module per domain area.

pub mod subscription;
