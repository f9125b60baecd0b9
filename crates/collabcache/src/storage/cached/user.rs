//! Cached user repository decorator.
//!
//! Wraps a `UserRepository` implementation with read-through caching and
//! invalidate-before-write.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{
    collection_key, entity_key, lookup_key, InvalidationRequest, KeyOp, WriteOp,
};
use collabcache_core::domain::User;
use collabcache_core::storage::{Page, Patch, Result, UserRepository};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached user repository decorator.
///
/// - **Reads**: `user:<id>`, `user:GetByEmail:<email>` and
///   `user:GetAll:<offset>:<limit>` are served from the central store and
///   populated from the repository on a miss
/// - **Writes**: the user's collections, the email lookups and everything
///   cached for organizations and roles are invalidated before the
///   repository is called
///
/// # Type Parameters
///
/// * `R` - The underlying repository implementation
pub struct CachedUserRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedUserRepository<R> {
    /// Creates a new cached user repository.
    ///
    /// # Arguments
    ///
    /// * `base` - Base cache repository holding the store and telemetry
    /// * `repository` - The underlying repository to cache
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }
}

impl<R: ?Sized> CachedRepository for CachedUserRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> UserRepository for CachedUserRepository<R>
where
    R: UserRepository + ?Sized + 'static,
{
    async fn create(&self, ctx: &RequestContext, user: &User) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::User, WriteOp::Create);
        self.base
            .write(ctx, &request, self.repository.create(ctx, user))
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<User> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> Result<User> {
        let key = lookup_key(ResourceType::User, KeyOp::GetByEmail, email);
        self.base
            .read_through(ctx, &key, self.repository.get_by_email(ctx, email))
            .await
    }

    async fn get_all(&self, ctx: &RequestContext, page: Page) -> Result<Vec<User>> {
        let key = collection_key(ResourceType::User, KeyOp::GetAll, None, page, &[]);
        self.base
            .read_through(ctx, &key, self.repository.get_all(ctx, page))
            .await
    }

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<User> {
        let key = entity_key(id);
        let request = InvalidationRequest::new(ResourceType::User, WriteOp::Update).key(&key);
        self.base
            .update(ctx, &request, &key, self.repository.update(ctx, id, patch))
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request =
            InvalidationRequest::new(ResourceType::User, WriteOp::Delete).key(entity_key(id));
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}
