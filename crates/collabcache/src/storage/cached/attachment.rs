//! Cached attachment repository decorator.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{collection_key, entity_key, InvalidationRequest, KeyOp, WriteOp};
use collabcache_core::domain::Attachment;
use collabcache_core::storage::{AttachmentRepository, Page, Result};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached attachment repository decorator. Mirrors the comment decorator.
pub struct CachedAttachmentRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedAttachmentRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }
}

impl<R: ?Sized> CachedRepository for CachedAttachmentRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> AttachmentRepository for CachedAttachmentRepository<R>
where
    R: AttachmentRepository + ?Sized + 'static,
{
    async fn create(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        attachment: &Attachment,
    ) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Attachment, WriteOp::Create)
            .scope(KeyOp::GetAllBelongsTo, belongs_to);
        self.base
            .write(
                ctx,
                &request,
                self.repository.create(ctx, belongs_to, attachment),
            )
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Attachment> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_all_belongs_to(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Attachment>> {
        let key = collection_key(
            ResourceType::Attachment,
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

    async fn update(&self, ctx: &RequestContext, id: &Id, name: &str) -> Result<Attachment> {
        let key = entity_key(id);
        let request =
            InvalidationRequest::new(ResourceType::Attachment, WriteOp::Update).key(&key);
        self.base
            .update(ctx, &request, &key, self.repository.update(ctx, id, name))
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Attachment, WriteOp::Delete)
            .key(entity_key(id));
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}
