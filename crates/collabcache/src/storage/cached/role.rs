//! Cached role repository decorator.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{collection_key, entity_key, InvalidationRequest, KeyOp, WriteOp};
use collabcache_core::domain::Role;
use collabcache_core::storage::{Page, Patch, Result, RoleRepository};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached role repository decorator.
///
/// Roles are scoped to an organization or a project. Every call that names
/// the scope narrows the list invalidation to it.
pub struct CachedRoleRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedRoleRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }

    fn scoped_request(op: WriteOp, role: &Id, belongs_to: &Id) -> InvalidationRequest {
        InvalidationRequest::new(ResourceType::Role, op)
            .scope(KeyOp::GetAllBelongsTo, belongs_to)
            .key(entity_key(role))
    }
}

impl<R: ?Sized> CachedRepository for CachedRoleRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> RoleRepository for CachedRoleRepository<R>
where
    R: RoleRepository + ?Sized + 'static,
{
    async fn create(
        &self,
        ctx: &RequestContext,
        created_by: &Id,
        belongs_to: &Id,
        role: &Role,
    ) -> Result<()> {
        let request = Self::scoped_request(WriteOp::Create, &role.id, belongs_to);
        self.base
            .write(
                ctx,
                &request,
                self.repository.create(ctx, created_by, belongs_to, role),
            )
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Role> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_all_belongs_to(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Role>> {
        let key = collection_key(
            ResourceType::Role,
            KeyOp::GetAllBelongsTo,
            Some(belongs_to),
            page,
            &[],
        );
        self.base
            .read_through(
                ctx,
                &key,
                self.repository.get_all_belongs_to(ctx, belongs_to, page),
            )
            .await
    }

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Role> {
        let key = entity_key(id);
        let request = InvalidationRequest::new(ResourceType::Role, WriteOp::Update).key(&key);
        self.base
            .update(ctx, &request, &key, self.repository.update(ctx, id, patch))
            .await
    }

    async fn add_member(
        &self,
        ctx: &RequestContext,
        role: &Id,
        member: &Id,
        belongs_to: &Id,
    ) -> Result<()> {
        let request = Self::scoped_request(WriteOp::AddMember, role, belongs_to);
        self.base
            .write(
                ctx,
                &request,
                self.repository.add_member(ctx, role, member, belongs_to),
            )
            .await
    }

    async fn remove_member(
        &self,
        ctx: &RequestContext,
        role: &Id,
        member: &Id,
        belongs_to: &Id,
    ) -> Result<()> {
        let request = Self::scoped_request(WriteOp::RemoveMember, role, belongs_to);
        self.base
            .write(
                ctx,
                &request,
                self.repository.remove_member(ctx, role, member, belongs_to),
            )
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id, belongs_to: &Id) -> Result<()> {
        let request = Self::scoped_request(WriteOp::Delete, id, belongs_to);
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id, belongs_to))
            .await
    }
}
