//! Shared service plumbing: configuration, tracing, HTTP middleware, error
//! bodies, extractors, sea-query helpers and shutdown signals.

pub mod config;
pub mod error;
pub mod extract;
pub mod health;
pub mod middleware;
pub mod sea_ext;
pub mod serde;
pub mod shutdown;
pub mod tracing;
