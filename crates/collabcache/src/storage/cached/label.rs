//! Cached label repository decorator.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{collection_key, entity_key, InvalidationRequest, KeyOp, WriteOp};
use collabcache_core::domain::Label;
use collabcache_core::storage::{LabelRepository, Page, Patch, Result};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached label repository decorator.
///
/// Attaching or detaching a label wipes the document family, which embeds
/// label lists. A label still attached to a document cannot be deleted, so
/// deletes never touch documents.
pub struct CachedLabelRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedLabelRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }

    fn link_request(op: WriteOp, label: &Id) -> InvalidationRequest {
        InvalidationRequest::new(ResourceType::Label, op).key(entity_key(label))
    }
}

impl<R: ?Sized> CachedRepository for CachedLabelRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> LabelRepository for CachedLabelRepository<R>
where
    R: LabelRepository + ?Sized + 'static,
{
    async fn create(&self, ctx: &RequestContext, label: &Label) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Label, WriteOp::Create);
        self.base
            .write(ctx, &request, self.repository.create(ctx, label))
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Label> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_all(&self, ctx: &RequestContext, page: Page) -> Result<Vec<Label>> {
        let key = collection_key(ResourceType::Label, KeyOp::GetAll, None, page, &[]);
        self.base
            .read_through(ctx, &key, self.repository.get_all(ctx, page))
            .await
    }

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Label> {
        let key = entity_key(id);
        let request = InvalidationRequest::new(ResourceType::Label, WriteOp::Update).key(&key);
        self.base
            .update(ctx, &request, &key, self.repository.update(ctx, id, patch))
            .await
    }

    async fn attach_to(&self, ctx: &RequestContext, label: &Id, target: &Id) -> Result<()> {
        let request = Self::link_request(WriteOp::AttachTo, label);
        self.base
            .write(ctx, &request, self.repository.attach_to(ctx, label, target))
            .await
    }

    async fn detach_from(&self, ctx: &RequestContext, label: &Id, target: &Id) -> Result<()> {
        let request = Self::link_request(WriteOp::DetachFrom, label);
        self.base
            .write(ctx, &request, self.repository.detach_from(ctx, label, target))
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request =
            InvalidationRequest::new(ResourceType::Label, WriteOp::Delete).key(entity_key(id));
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabcache_core::cache::KeyValueStore;

    use collabcache_core::domain::Document;
    use collabcache_core::storage::{DocumentRepository, RepositoryError};

    use crate::cache::Telemetry;
    use crate::storage::cached::CachedDocumentRepository;
    use crate::storage::inmemory::InMemoryRepository;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_attach_wipes_documents_but_plain_writes_do_not() {
        let ctx = RequestContext::new();
        let store = Arc::new(MemoryStore::new(100));
        let repo = Arc::new(InMemoryRepository::new());
        let base = BaseCacheRepository::new(store.clone(), Telemetry::default(), None);
        let cached = CachedLabelRepository::new(base, repo.clone());
        store.set("document:document_1", b"{}", None).await.unwrap();

        let label = Label::new("draft");
        cached.create(&ctx, &label).await.unwrap();
        assert!(store.contains("document:document_1").await);

        // Unknown target kinds are rejected by the repository after the
        // invalidation already ran.
        let result = cached
            .attach_to(&ctx, &label.id, &Id::new(ResourceType::Todo))
            .await;
        assert!(result.is_err());
        assert!(!store.contains("document:document_1").await);
    }

    #[tokio::test]
    async fn test_get_all_cached_until_next_create() {
        let ctx = RequestContext::new();
        let store = Arc::new(MemoryStore::new(100));
        let repo = Arc::new(InMemoryRepository::new());
        let base = BaseCacheRepository::new(store.clone(), Telemetry::default(), None);
        let cached = CachedLabelRepository::new(base, repo.clone());

        cached.create(&ctx, &Label::new("bug")).await.unwrap();
        assert_eq!(cached.get_all(&ctx, Page::default()).await.unwrap().len(), 1);
        assert!(store.contains("label:GetAll:0:10").await);

        cached.create(&ctx, &Label::new("feature")).await.unwrap();
        assert!(!store.contains("label:GetAll:0:10").await);
        assert_eq!(cached.get_all(&ctx, Page::default()).await.unwrap().len(), 2);
    }

    async fn stored_labels(repo: &InMemoryRepository, ctx: &RequestContext, id: &Id) -> Vec<Id> {
        DocumentRepository::get(repo, ctx, id).await.unwrap().labels
    }

    #[tokio::test]
    async fn test_cached_document_follows_label_lifecycle() {
        let ctx = RequestContext::new();
        let store = Arc::new(MemoryStore::new(100));
        let repo = Arc::new(InMemoryRepository::new());
        let base = BaseCacheRepository::new(store.clone(), Telemetry::default(), None);
        let labels = CachedLabelRepository::new(base.clone(), repo.clone());
        let documents = CachedDocumentRepository::new(base, repo.clone());
        let author = Id::new(ResourceType::User);
        let document = Document::new("Spec", "file-1", author);
        documents.create(&ctx, &author, &document).await.unwrap();
        let label = Label::new("draft");
        labels.create(&ctx, &label).await.unwrap();

        labels.attach_to(&ctx, &label.id, &document.id).await.unwrap();
        let cached = documents.get(&ctx, &document.id).await.unwrap().labels;
        assert_eq!(cached, vec![label.id]);
        assert_eq!(cached, stored_labels(&repo, &ctx, &document.id).await);

        let result = labels.delete(&ctx, &label.id).await;
        assert!(matches!(result, Err(RepositoryError::WriteFailed { .. })));
        let cached = documents.get(&ctx, &document.id).await.unwrap().labels;
        assert_eq!(cached, stored_labels(&repo, &ctx, &document.id).await);

        labels
            .detach_from(&ctx, &label.id, &document.id)
            .await
            .unwrap();
        labels.delete(&ctx, &label.id).await.unwrap();
        let cached = documents.get(&ctx, &document.id).await.unwrap().labels;
        assert!(cached.is_empty());
        assert_eq!(cached, stored_labels(&repo, &ctx, &document.id).await);
    }
}
