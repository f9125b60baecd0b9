//! Functional core of the collabcache layer.
//!
//! Everything in this crate is free of I/O: identifiers, domain entity
//! shapes, cache key composition, the invalidation topology and the traits
//! the imperative shell (`collabcache`) implements or consumes.

pub mod cache;
pub mod context;
pub mod domain;
pub mod id;
pub mod storage;

pub use context::{ContextError, RequestContext};
pub use id::{Id, IdError, ResourceType};
