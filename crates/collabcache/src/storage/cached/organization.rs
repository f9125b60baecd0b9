//! Cached organization repository decorator.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{collection_key, entity_key, InvalidationRequest, KeyOp, WriteOp};
use collabcache_core::domain::Organization;
use collabcache_core::storage::{OrganizationRepository, Page, Patch, Result};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached organization repository decorator.
///
/// Member changes drop the organization's own key; organizations have no
/// cross-entity edges of their own.
pub struct CachedOrganizationRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedOrganizationRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }

    async fn write_member<F>(
        &self,
        ctx: &RequestContext,
        op: WriteOp,
        org: &Id,
        write: F,
    ) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        let request =
            InvalidationRequest::new(ResourceType::Organization, op).key(entity_key(org));
        self.base.write(ctx, &request, write).await
    }
}

impl<R: ?Sized> CachedRepository for CachedOrganizationRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> OrganizationRepository for CachedOrganizationRepository<R>
where
    R: OrganizationRepository + ?Sized + 'static,
{
    async fn create(&self, ctx: &RequestContext, owner: &Id, org: &Organization) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Organization, WriteOp::Create);
        self.base
            .write(ctx, &request, self.repository.create(ctx, owner, org))
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Organization> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_all(&self, ctx: &RequestContext, page: Page) -> Result<Vec<Organization>> {
        let key = collection_key(ResourceType::Organization, KeyOp::GetAll, None, page, &[]);
        self.base
            .read_through(ctx, &key, self.repository.get_all(ctx, page))
            .await
    }

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Organization> {
        let key = entity_key(id);
        let request =
            InvalidationRequest::new(ResourceType::Organization, WriteOp::Update).key(&key);
        self.base
            .update(ctx, &request, &key, self.repository.update(ctx, id, patch))
            .await
    }

    async fn add_member(&self, ctx: &RequestContext, org: &Id, member: &Id) -> Result<()> {
        self.write_member(
            ctx,
            WriteOp::AddMember,
            org,
            self.repository.add_member(ctx, org, member),
        )
        .await
    }

    async fn remove_member(&self, ctx: &RequestContext, org: &Id, member: &Id) -> Result<()> {
        self.write_member(
            ctx,
            WriteOp::RemoveMember,
            org,
            self.repository.remove_member(ctx, org, member),
        )
        .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Organization, WriteOp::Delete)
            .key(entity_key(id));
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}
