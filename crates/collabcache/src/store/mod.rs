//! Central store implementations.
//!
//! This module provides concrete implementations of the
//! `collabcache_core::cache::KeyValueStore` trait.
//!
//! # Feature Flags
//!
//! - `MemoryStore` is always available. It is the central store for
//!   single-process deployments and for tests.
//! - `redis`: Redis store using the redis crate.

mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use memory::MemoryStore;

#[cfg(feature = "redis")]
pub use redis_impl::RedisStore;
