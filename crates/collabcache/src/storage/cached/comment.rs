//! Cached comment repository decorator.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{collection_key, entity_key, InvalidationRequest, KeyOp, WriteOp};
use collabcache_core::domain::Comment;
use collabcache_core::storage::{CommentRepository, Page, Result};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached comment repository decorator.
///
/// Comments belong to an issue or a document, and both families embed their
/// comment lists, so every write wipes `issue:*` and `document:*`.
pub struct CachedCommentRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedCommentRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }
}

impl<R: ?Sized> CachedRepository for CachedCommentRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> CommentRepository for CachedCommentRepository<R>
where
    R: CommentRepository + ?Sized + 'static,
{
    async fn create(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        comment: &Comment,
    ) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Comment, WriteOp::Create)
            .scope(KeyOp::GetAllBelongsTo, belongs_to);
        self.base
            .write(ctx, &request, self.repository.create(ctx, belongs_to, comment))
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Comment> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_all_belongs_to(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Comment>> {
        let key = collection_key(
            ResourceType::Comment,
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

    async fn update(&self, ctx: &RequestContext, id: &Id, content: &str) -> Result<Comment> {
        let key = entity_key(id);
        let request = InvalidationRequest::new(ResourceType::Comment, WriteOp::Update).key(&key);
        self.base
            .update(ctx, &request, &key, self.repository.update(ctx, id, content))
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request =
            InvalidationRequest::new(ResourceType::Comment, WriteOp::Delete).key(entity_key(id));
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}
