//! Cached project repository decorator.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{
    collection_key, entity_key, lookup_key, InvalidationRequest, KeyOp, WriteOp,
};
use collabcache_core::domain::Project;
use collabcache_core::storage::{Page, Patch, ProjectRepository, Result};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached project repository decorator.
///
/// Projects can also be looked up by their key
/// (`project:GetByKey:<key>`); those lookups are dropped by every write
/// that touches an existing project.
pub struct CachedProjectRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedProjectRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }
}

impl<R: ?Sized> CachedRepository for CachedProjectRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> ProjectRepository for CachedProjectRepository<R>
where
    R: ProjectRepository + ?Sized + 'static,
{
    async fn create(&self, ctx: &RequestContext, namespace: &Id, project: &Project) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Project, WriteOp::Create)
            .scope(KeyOp::GetAll, namespace);
        self.base
            .write(ctx, &request, self.repository.create(ctx, namespace, project))
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Project> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_by_key(&self, ctx: &RequestContext, key: &str) -> Result<Project> {
        let cache_key = lookup_key(ResourceType::Project, KeyOp::GetByKey, key);
        self.base
            .read_through(ctx, &cache_key, self.repository.get_by_key(ctx, key))
            .await
    }

    async fn get_all(
        &self,
        ctx: &RequestContext,
        namespace: &Id,
        page: Page,
    ) -> Result<Vec<Project>> {
        let key = collection_key(
            ResourceType::Project,
            KeyOp::GetAll,
            Some(namespace),
            page,
            &[],
        );
        self.base
            .read_through(ctx, &key, self.repository.get_all(ctx, namespace, page))
            .await
    }

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Project> {
        let key = entity_key(id);
        let request = InvalidationRequest::new(ResourceType::Project, WriteOp::Update).key(&key);
        self.base
            .update(ctx, &request, &key, self.repository.update(ctx, id, patch))
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request =
            InvalidationRequest::new(ResourceType::Project, WriteOp::Delete).key(entity_key(id));
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabcache_core::domain::{Namespace, Organization, User};
    use collabcache_core::storage::{NamespaceRepository, OrganizationRepository, UserRepository};
    use serde_json::json;

    use crate::cache::Telemetry;
    use crate::storage::cached::CachedNamespaceRepository;
    use crate::storage::inmemory::InMemoryRepository;
    use crate::store::MemoryStore;

    async fn seed(repo: &InMemoryRepository, ctx: &RequestContext) -> Namespace {
        let owner = User::new("alice", "a@x");
        UserRepository::create(repo, ctx, &owner).await.unwrap();
        let org = Organization::new("acme", "ops@acme");
        OrganizationRepository::create(repo, ctx, &owner.id, &org)
            .await
            .unwrap();
        let namespace = Namespace::new("eng");
        NamespaceRepository::create(repo, ctx, &org.id, &namespace)
            .await
            .unwrap();
        namespace
    }

    #[tokio::test]
    async fn test_get_by_key_is_cached() {
        let ctx = RequestContext::new();
        let store = Arc::new(MemoryStore::new(100));
        let repo = Arc::new(InMemoryRepository::new());
        let namespace = seed(&repo, &ctx).await;
        let base = BaseCacheRepository::new(store.clone(), Telemetry::default(), None);
        let cached = CachedProjectRepository::new(base, repo.clone());
        cached
            .create(&ctx, &namespace.id, &Project::new("CORE", "Core"))
            .await
            .unwrap();

        repo.reset_calls();
        let first = cached.get_by_key(&ctx, "CORE").await.unwrap();
        let second = cached.get_by_key(&ctx, "CORE").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.reads(), 1);
        assert!(store.contains("project:GetByKey:CORE").await);
    }

    #[tokio::test]
    async fn test_update_drops_key_lookups() {
        let ctx = RequestContext::new();
        let store = Arc::new(MemoryStore::new(100));
        let repo = Arc::new(InMemoryRepository::new());
        let namespace = seed(&repo, &ctx).await;
        let base = BaseCacheRepository::new(store.clone(), Telemetry::default(), None);
        let cached = CachedProjectRepository::new(base, repo.clone());
        let project = Project::new("CORE", "Core");
        cached.create(&ctx, &namespace.id, &project).await.unwrap();
        cached.get_by_key(&ctx, "CORE").await.unwrap();

        let patch = match json!({ "key": "PLAT" }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        cached.update(&ctx, &project.id, &patch).await.unwrap();

        assert!(!store.contains("project:GetByKey:CORE").await);
        assert!(cached.get_by_key(&ctx, "CORE").await.unwrap_err().is_not_found());
        assert_eq!(cached.get_by_key(&ctx, "PLAT").await.unwrap().id, project.id);
    }

    #[tokio::test]
    async fn test_create_wipes_namespace_family() {
        let ctx = RequestContext::new();
        let store = Arc::new(MemoryStore::new(100));
        let repo = Arc::new(InMemoryRepository::new());
        let namespace = seed(&repo, &ctx).await;
        let base = BaseCacheRepository::new(store.clone(), Telemetry::default(), None);

        let namespaces = CachedNamespaceRepository::new(base.clone(), repo.clone());
        let before = namespaces.get(&ctx, &namespace.id).await.unwrap();
        assert!(before.projects.is_empty());

        let cached = CachedProjectRepository::new(base, repo.clone());
        let project = Project::new("CORE", "Core");
        cached.create(&ctx, &namespace.id, &project).await.unwrap();

        let after = namespaces.get(&ctx, &namespace.id).await.unwrap();
        assert_eq!(after.projects, vec![project.id]);
    }
}
