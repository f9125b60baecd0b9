//! Cached repository decorators.
//!
//! One decorator per authoritative repository trait. Each wraps the
//! authoritative implementation and implements the same trait:
//!
//! - **Reads**: check the central store first, on a miss fetch from the
//!   repository and populate the store
//! - **Writes**: invalidate every key the write may affect, then call the
//!   repository; updates also refresh the entity key with the fresh value
//!
//! Permission reads are never cached.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let users = RepositoryBuilder::new()
//!     .store(Arc::new(MemoryStore::new(10_000)))
//!     .repository(Arc::new(InMemoryRepository::new()))
//!     .default_ttl(Duration::from_secs(300))
//!     .with_global_telemetry()
//!     .build::<CachedUserRepository<_>>()?;
//! ```

mod assignment;
mod attachment;
mod comment;
mod document;
mod issue;
mod label;
mod namespace;
mod notification;
mod organization;
mod permission;
mod project;
mod role;
mod todo;
mod user;

pub use assignment::CachedAssignmentRepository;
pub use attachment::CachedAttachmentRepository;
pub use comment::CachedCommentRepository;
pub use document::CachedDocumentRepository;
pub use issue::CachedIssueRepository;
pub use label::CachedLabelRepository;
pub use namespace::CachedNamespaceRepository;
pub use notification::CachedNotificationRepository;
pub use organization::CachedOrganizationRepository;
pub use permission::CachedPermissionRepository;
pub use project::CachedProjectRepository;
pub use role::CachedRoleRepository;
pub use todo::CachedTodoRepository;
pub use user::CachedUserRepository;
