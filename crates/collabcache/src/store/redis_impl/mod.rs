//! Redis central store implementation.
//!
//! Provides a shared store for multi-instance deployments using a
//! `ConnectionManager`, which reconnects transparently and can be cloned
//! cheaply for concurrent use.

mod error;
mod store;

pub use store::RedisStore;
