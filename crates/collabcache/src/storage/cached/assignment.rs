//! Cached assignment repository decorator.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{collection_key, entity_key, InvalidationRequest, KeyOp, WriteOp};
use collabcache_core::domain::Assignment;
use collabcache_core::storage::{AssignmentRepository, Page, Result};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached assignment repository decorator.
///
/// Assignments are listed from both ends: by the assigned user
/// (`assignment:GetBySubject:<user>:..`) and by the assigned resource
/// (`assignment:GetByTarget:<resource>:..`).
pub struct CachedAssignmentRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedAssignmentRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }
}

impl<R: ?Sized> CachedRepository for CachedAssignmentRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> AssignmentRepository for CachedAssignmentRepository<R>
where
    R: AssignmentRepository + ?Sized + 'static,
{
    async fn create(&self, ctx: &RequestContext, assignment: &Assignment) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Assignment, WriteOp::Create)
            .scope(KeyOp::GetBySubject, &assignment.user)
            .scope(KeyOp::GetByTarget, &assignment.resource);
        self.base
            .write(ctx, &request, self.repository.create(ctx, assignment))
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Assignment> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_by_user(
        &self,
        ctx: &RequestContext,
        user: &Id,
        page: Page,
    ) -> Result<Vec<Assignment>> {
        let key = collection_key(
            ResourceType::Assignment,
            KeyOp::GetBySubject,
            Some(user),
            page,
            &[],
        );
        self.base
            .read_through(ctx, &key, self.repository.get_by_user(ctx, user, page))
            .await
    }

    async fn get_by_resource(
        &self,
        ctx: &RequestContext,
        resource: &Id,
        page: Page,
    ) -> Result<Vec<Assignment>> {
        let key = collection_key(
            ResourceType::Assignment,
            KeyOp::GetByTarget,
            Some(resource),
            page,
            &[],
        );
        self.base
            .read_through(
                ctx,
                &key,
                self.repository.get_by_resource(ctx, resource, page),
            )
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Assignment, WriteOp::Delete)
            .key(entity_key(id));
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}
