//! Repository implementations.
//!
//! - [`cached`]: decorators adding read-through caching and write
//!   invalidation to any authoritative repository
//! - [`inmemory`]: an in-memory authoritative repository (feature `inmemory`)

pub mod cached;
#[cfg(any(test, feature = "inmemory"))]
pub mod inmemory;

pub use cached::*;
#[cfg(any(test, feature = "inmemory"))]
pub use inmemory::InMemoryRepository;
