//! Cached namespace repository decorator.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{collection_key, entity_key, InvalidationRequest, KeyOp, WriteOp};
use collabcache_core::domain::Namespace;
use collabcache_core::storage::{NamespaceRepository, Page, Patch, Result};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached namespace repository decorator.
///
/// Namespace lists are scoped by organization
/// (`namespace:GetAll:<org>:<offset>:<limit>`). Every write also wipes the
/// organization family, whose entities embed their namespace lists.
pub struct CachedNamespaceRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedNamespaceRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }
}

impl<R: ?Sized> CachedRepository for CachedNamespaceRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> NamespaceRepository for CachedNamespaceRepository<R>
where
    R: NamespaceRepository + ?Sized + 'static,
{
    async fn create(&self, ctx: &RequestContext, org: &Id, namespace: &Namespace) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Namespace, WriteOp::Create)
            .scope(KeyOp::GetAll, org);
        self.base
            .write(ctx, &request, self.repository.create(ctx, org, namespace))
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Namespace> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_all(&self, ctx: &RequestContext, org: &Id, page: Page) -> Result<Vec<Namespace>> {
        let key = collection_key(ResourceType::Namespace, KeyOp::GetAll, Some(org), page, &[]);
        self.base
            .read_through(ctx, &key, self.repository.get_all(ctx, org, page))
            .await
    }

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Namespace> {
        let key = entity_key(id);
        let request = InvalidationRequest::new(ResourceType::Namespace, WriteOp::Update).key(&key);
        self.base
            .update(ctx, &request, &key, self.repository.update(ctx, id, patch))
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request =
            InvalidationRequest::new(ResourceType::Namespace, WriteOp::Delete).key(entity_key(id));
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}
