//! Cached issue repository decorator.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{collection_key, entity_key, InvalidationRequest, KeyOp, WriteOp};
use collabcache_core::domain::Issue;
use collabcache_core::storage::{IssueRepository, Page, Patch, Result};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached issue repository decorator.
///
/// Issue lists are scoped by project. Every write wipes the comment family;
/// creation also wipes the attachment family.
pub struct CachedIssueRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedIssueRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }
}

impl<R: ?Sized> CachedRepository for CachedIssueRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> IssueRepository for CachedIssueRepository<R>
where
    R: IssueRepository + ?Sized + 'static,
{
    async fn create(&self, ctx: &RequestContext, project: &Id, issue: &Issue) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Issue, WriteOp::Create)
            .scope(KeyOp::GetAllBelongsTo, project);
        self.base
            .write(ctx, &request, self.repository.create(ctx, project, issue))
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Issue> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_all_belongs_to(
        &self,
        ctx: &RequestContext,
        project: &Id,
        page: Page,
    ) -> Result<Vec<Issue>> {
        let key = collection_key(
            ResourceType::Issue,
            KeyOp::GetAllBelongsTo,
            Some(project),
            page,
            &[],
        );
        self.base
            .read_through(
                ctx,
                &key,
                self.repository.get_all_belongs_to(ctx, project, page),
            )
            .await
    }

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Issue> {
        let key = entity_key(id);
        let request = InvalidationRequest::new(ResourceType::Issue, WriteOp::Update).key(&key);
        self.base
            .update(ctx, &request, &key, self.repository.update(ctx, id, patch))
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request =
            InvalidationRequest::new(ResourceType::Issue, WriteOp::Delete).key(entity_key(id));
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use collabcache_core::cache::KeyValueStore;
    use collabcache_core::domain::IssueKind;
    use collabcache_core::storage::RepositoryError;

    use crate::cache::Telemetry;
    use crate::store::MemoryStore;

    // Mock repository that only counts writes
    #[derive(Default)]
    struct CountingIssueRepository {
        writes: AtomicUsize,
    }

    #[async_trait]
    impl IssueRepository for CountingIssueRepository {
        async fn create(&self, _ctx: &RequestContext, _project: &Id, _issue: &Issue) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Issue> {
            Err(RepositoryError::not_found("Issue", id))
        }

        async fn get_all_belongs_to(
            &self,
            _ctx: &RequestContext,
            _project: &Id,
            _page: Page,
        ) -> Result<Vec<Issue>> {
            Ok(Vec::new())
        }

        async fn update(&self, _ctx: &RequestContext, id: &Id, _patch: &Patch) -> Result<Issue> {
            Err(RepositoryError::not_found("Issue", id))
        }

        async fn delete(&self, _ctx: &RequestContext, _id: &Id) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn seeded_store(keys: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new(100));
        for key in keys {
            store.set(key, b"{}", None).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_create_wipes_comments_and_attachments() {
        let ctx = RequestContext::new();
        let store = seeded_store(&[
            "comment:comment_1",
            "attachment:attachment_1",
            "document:document_1",
        ])
        .await;
        let repo = Arc::new(CountingIssueRepository::default());
        let base = BaseCacheRepository::new(store.clone(), Telemetry::default(), None);
        let cached = CachedIssueRepository::new(base, repo.clone());

        let reporter = Id::new(ResourceType::User);
        cached
            .create(
                &ctx,
                &Id::new(ResourceType::Project),
                &Issue::new(1, IssueKind::Bug, "Crash", reporter),
            )
            .await
            .unwrap();

        assert!(!store.contains("comment:comment_1").await);
        assert!(!store.contains("attachment:attachment_1").await);
        assert!(store.contains("document:document_1").await);
        assert_eq!(repo.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_keeps_attachments() {
        let ctx = RequestContext::new();
        let issue = Id::new(ResourceType::Issue);
        let store = seeded_store(&["comment:comment_1", "attachment:attachment_1"]).await;
        store.set(&entity_key(&issue), b"{}", None).await.unwrap();
        let repo = Arc::new(CountingIssueRepository::default());
        let base = BaseCacheRepository::new(store.clone(), Telemetry::default(), None);
        let cached = CachedIssueRepository::new(base, repo.clone());

        cached.delete(&ctx, &issue).await.unwrap();

        assert!(!store.contains(&entity_key(&issue)).await);
        assert!(!store.contains("comment:comment_1").await);
        assert!(store.contains("attachment:attachment_1").await);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_no_entity_key() {
        let ctx = RequestContext::new();
        let issue = Id::new(ResourceType::Issue);
        let store = seeded_store(&[]).await;
        store.set(&entity_key(&issue), b"{}", None).await.unwrap();
        let repo = Arc::new(CountingIssueRepository::default());
        let base = BaseCacheRepository::new(store.clone(), Telemetry::default(), None);
        let cached = CachedIssueRepository::new(base, repo);

        let result = cached.update(&ctx, &issue, &Patch::new()).await;

        assert!(matches!(result, Err(ref e) if e.is_not_found()));
        assert!(!store.contains(&entity_key(&issue)).await);
    }
}
