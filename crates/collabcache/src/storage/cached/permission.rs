//! Cached permission repository decorator.
//!
//! Proxy-only: permission reads always go to the underlying repository.
//! Writes still invalidate the role and user families before they run.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{InvalidationRequest, WriteOp};
use collabcache_core::domain::{Permission, PermissionKind};
use collabcache_core::storage::{PermissionRepository, Result};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached permission repository decorator.
pub struct CachedPermissionRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedPermissionRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }
}

impl<R: ?Sized> CachedRepository for CachedPermissionRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> PermissionRepository for CachedPermissionRepository<R>
where
    R: PermissionRepository + ?Sized + 'static,
{
    async fn create(&self, ctx: &RequestContext, permission: &Permission) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Permission, WriteOp::Create);
        self.base
            .write(ctx, &request, self.repository.create(ctx, permission))
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Permission> {
        self.base.proxy(ctx, self.repository.get(ctx, id)).await
    }

    async fn get_by_subject(&self, ctx: &RequestContext, subject: &Id) -> Result<Vec<Permission>> {
        self.base
            .proxy(ctx, self.repository.get_by_subject(ctx, subject))
            .await
    }

    async fn get_by_target(&self, ctx: &RequestContext, target: &Id) -> Result<Vec<Permission>> {
        self.base
            .proxy(ctx, self.repository.get_by_target(ctx, target))
            .await
    }

    async fn get_by_subject_and_target(
        &self,
        ctx: &RequestContext,
        subject: &Id,
        target: &Id,
    ) -> Result<Vec<Permission>> {
        self.base
            .proxy(
                ctx,
                self.repository.get_by_subject_and_target(ctx, subject, target),
            )
            .await
    }

    async fn has_permission(
        &self,
        ctx: &RequestContext,
        subject: &Id,
        target: &Id,
        kinds: &[PermissionKind],
    ) -> Result<bool> {
        self.base
            .proxy(
                ctx,
                self.repository.has_permission(ctx, subject, target, kinds),
            )
            .await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: &Id,
        kind: PermissionKind,
    ) -> Result<Permission> {
        let request = InvalidationRequest::new(ResourceType::Permission, WriteOp::Update);
        self.base
            .write(ctx, &request, self.repository.update(ctx, id, kind))
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Permission, WriteOp::Delete);
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabcache_core::cache::KeyValueStore;
    use collabcache_core::ContextError;
    use collabcache_core::storage::RepositoryError;

    use crate::cache::Telemetry;
    use crate::storage::inmemory::InMemoryRepository;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_reads_are_never_cached() {
        let ctx = RequestContext::new();
        let store = Arc::new(MemoryStore::new(100));
        let repo = Arc::new(InMemoryRepository::new());
        let base = BaseCacheRepository::new(store.clone(), Telemetry::default(), None);
        let cached = CachedPermissionRepository::new(base, repo.clone());
        let subject = Id::new(ResourceType::User);
        let target = Id::new(ResourceType::Project);
        cached
            .create(&ctx, &Permission::new(PermissionKind::Read, subject, target))
            .await
            .unwrap();

        repo.reset_calls();
        cached.get_by_subject(&ctx, &subject).await.unwrap();
        cached.get_by_subject(&ctx, &subject).await.unwrap();
        assert!(cached
            .has_permission(&ctx, &subject, &target, &[PermissionKind::Read])
            .await
            .unwrap());

        assert_eq!(repo.reads(), 3);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_wipes_roles_and_users() {
        let ctx = RequestContext::new();
        let store = Arc::new(MemoryStore::new(100));
        for key in ["role:role_1", "user:user_1", "organization:organization_1"] {
            store.set(key, b"{}", None).await.unwrap();
        }
        let repo = Arc::new(InMemoryRepository::new());
        let base = BaseCacheRepository::new(store.clone(), Telemetry::default(), None);
        let cached = CachedPermissionRepository::new(base, repo.clone());

        let permission = Permission::new(
            PermissionKind::All,
            Id::new(ResourceType::User),
            Id::new(ResourceType::Organization),
        );
        cached.create(&ctx, &permission).await.unwrap();

        assert!(!store.contains("role:role_1").await);
        assert!(!store.contains("user:user_1").await);
        assert!(store.contains("organization:organization_1").await);
        assert_eq!(repo.writes(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_read_skips_repository() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let repo = Arc::new(InMemoryRepository::new());
        let base = BaseCacheRepository::new(
            Arc::new(MemoryStore::new(100)),
            Telemetry::default(),
            None,
        );
        let cached = CachedPermissionRepository::new(base, repo.clone());

        let result = cached
            .get_by_target(&ctx, &Id::new(ResourceType::Project))
            .await;

        assert_eq!(result, Err(RepositoryError::Context(ContextError::Cancelled)));
        assert_eq!(repo.reads(), 0);
    }
}
