//! Cached document repository decorator.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{collection_key, entity_key, InvalidationRequest, KeyOp, WriteOp};
use collabcache_core::domain::Document;
use collabcache_core::storage::{DocumentRepository, Page, Patch, Result};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached document repository decorator.
///
/// A document sits in two collections at once: its parent's
/// (`document:GetAllBelongsTo:<parent>:..`) and its creator's
/// (`document:GetByCreator:<user>:..`). Creation narrows both patterns to the
/// known scopes; updates and deletes do not know them and wipe each
/// collection across all scopes.
pub struct CachedDocumentRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedDocumentRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }
}

impl<R: ?Sized> CachedRepository for CachedDocumentRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> DocumentRepository for CachedDocumentRepository<R>
where
    R: DocumentRepository + ?Sized + 'static,
{
    async fn create(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        document: &Document,
    ) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Document, WriteOp::Create)
            .scope(KeyOp::GetAllBelongsTo, belongs_to)
            .scope(KeyOp::GetByCreator, &document.created_by);
        self.base
            .write(
                ctx,
                &request,
                self.repository.create(ctx, belongs_to, document),
            )
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Document> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_by_creator(
        &self,
        ctx: &RequestContext,
        created_by: &Id,
        page: Page,
    ) -> Result<Vec<Document>> {
        let key = collection_key(
            ResourceType::Document,
            KeyOp::GetByCreator,
            Some(created_by),
            page,
            &[],
        );
        self.base
            .read_through(
                ctx,
                &key,
                self.repository.get_by_creator(ctx, created_by, page),
            )
            .await
    }

    async fn get_all_belongs_to(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Document>> {
        let key = collection_key(
            ResourceType::Document,
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

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Document> {
        let key = entity_key(id);
        let request = InvalidationRequest::new(ResourceType::Document, WriteOp::Update).key(&key);
        self.base
            .update(ctx, &request, &key, self.repository.update(ctx, id, patch))
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request =
            InvalidationRequest::new(ResourceType::Document, WriteOp::Delete).key(entity_key(id));
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}
