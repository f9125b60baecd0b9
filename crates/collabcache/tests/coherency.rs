//! End-to-end coherency scenarios across the cached repositories.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use collabcache::testing::FaultyStore;
use collabcache::{
    BaseCacheRepository, CachedCommentRepository, CachedDocumentRepository, CachedIssueRepository,
    CachedPermissionRepository, CachedProjectRepository, CachedUserRepository,
    InMemoryRepository, MemoryStore, RepositoryBuilder, Telemetry,
};
use collabcache_core::cache::{
    collection_key, entity_key, KeyOp, KeyValueStore, StoreError, WriteOp,
};
use collabcache_core::domain::{
    Comment, Document, Issue, IssueKind, Namespace, Organization, Permission, PermissionKind,
    Project, User,
};
use collabcache_core::storage::{
    CommentRepository, DocumentRepository, IssueRepository, NamespaceRepository,
    OrganizationRepository, Page, Patch, PermissionRepository, ProjectRepository,
    RepositoryError, Result, UserRepository,
};
use collabcache_core::{Id, RequestContext, ResourceType};

fn base(store: Arc<dyn KeyValueStore>) -> BaseCacheRepository {
    BaseCacheRepository::new(store, Telemetry::default(), None)
}

fn patch(value: serde_json::Value) -> Patch {
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Authoritative repository that snapshots which watched keys are still in
/// the store at the moment a write reaches it.
struct WriteWitness {
    inner: InMemoryRepository,
    store: Arc<MemoryStore>,
    watched: Vec<String>,
    surviving: Mutex<Vec<String>>,
    writes: AtomicUsize,
}

impl WriteWitness {
    fn new(inner: InMemoryRepository, store: Arc<MemoryStore>, watched: &[&str]) -> Self {
        Self {
            inner,
            store,
            watched: watched.iter().map(|p| p.to_string()).collect(),
            surviving: Mutex::new(Vec::new()),
            writes: AtomicUsize::new(0),
        }
    }

    async fn record(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut found = Vec::new();
        for pattern in &self.watched {
            found.extend(self.store.keys(pattern).await.unwrap());
        }
        self.surviving.lock().unwrap().extend(found);
    }

    fn surviving(&self) -> Vec<String> {
        self.surviving.lock().unwrap().clone()
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommentRepository for WriteWitness {
    async fn create(&self, ctx: &RequestContext, belongs_to: &Id, comment: &Comment) -> Result<()> {
        self.record().await;
        CommentRepository::create(&self.inner, ctx, belongs_to, comment).await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Comment> {
        CommentRepository::get(&self.inner, ctx, id).await
    }

    async fn get_all_belongs_to(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Comment>> {
        CommentRepository::get_all_belongs_to(&self.inner, ctx, belongs_to, page).await
    }

    async fn update(&self, ctx: &RequestContext, id: &Id, content: &str) -> Result<Comment> {
        self.record().await;
        CommentRepository::update(&self.inner, ctx, id, content).await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        self.record().await;
        CommentRepository::delete(&self.inner, ctx, id).await
    }
}

#[async_trait]
impl PermissionRepository for WriteWitness {
    async fn create(&self, ctx: &RequestContext, permission: &Permission) -> Result<()> {
        self.record().await;
        PermissionRepository::create(&self.inner, ctx, permission).await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Permission> {
        PermissionRepository::get(&self.inner, ctx, id).await
    }

    async fn get_by_subject(&self, ctx: &RequestContext, subject: &Id) -> Result<Vec<Permission>> {
        self.inner.get_by_subject(ctx, subject).await
    }

    async fn get_by_target(&self, ctx: &RequestContext, target: &Id) -> Result<Vec<Permission>> {
        self.inner.get_by_target(ctx, target).await
    }

    async fn get_by_subject_and_target(
        &self,
        ctx: &RequestContext,
        subject: &Id,
        target: &Id,
    ) -> Result<Vec<Permission>> {
        self.inner
            .get_by_subject_and_target(ctx, subject, target)
            .await
    }

    async fn has_permission(
        &self,
        ctx: &RequestContext,
        subject: &Id,
        target: &Id,
        kinds: &[PermissionKind],
    ) -> Result<bool> {
        self.inner.has_permission(ctx, subject, target, kinds).await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: &Id,
        kind: PermissionKind,
    ) -> Result<Permission> {
        self.record().await;
        PermissionRepository::update(&self.inner, ctx, id, kind).await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        self.record().await;
        PermissionRepository::delete(&self.inner, ctx, id).await
    }
}

/// Seeds a user, an organization, a namespace, a project and an issue.
async fn seed_issue(repo: &InMemoryRepository, ctx: &RequestContext) -> (User, Project, Issue) {
    let user = User::new("alice", "a@x");
    UserRepository::create(repo, ctx, &user).await.unwrap();
    let org = Organization::new("acme", "ops@acme");
    OrganizationRepository::create(repo, ctx, &user.id, &org)
        .await
        .unwrap();
    let namespace = Namespace::new("eng");
    NamespaceRepository::create(repo, ctx, &org.id, &namespace)
        .await
        .unwrap();
    let project = Project::new("CORE", "Core");
    ProjectRepository::create(repo, ctx, &namespace.id, &project)
        .await
        .unwrap();
    let issue = Issue::new(1, IssueKind::Task, "Ship it", user.id);
    IssueRepository::create(repo, ctx, &project.id, &issue)
        .await
        .unwrap();
    (user, project, issue)
}

#[tokio::test]
async fn test_read_through_miss_then_hit() {
    let ctx = RequestContext::new();
    let store = Arc::new(MemoryStore::new(1_000));
    let repo = Arc::new(InMemoryRepository::new());
    let user = User::new("u1", "a@x");
    UserRepository::create(repo.as_ref(), &ctx, &user)
        .await
        .unwrap();
    repo.reset_calls();

    let users = CachedUserRepository::new(base(store.clone()), repo.clone());

    let first = users.get(&ctx, &user.id).await.unwrap();
    assert_eq!(first.email, "a@x");
    assert_eq!(repo.reads(), 1);
    assert!(store.contains(&entity_key(&user.id)).await);

    let second = users.get(&ctx, &user.id).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(repo.reads(), 1);
}

#[tokio::test]
async fn test_comment_create_invalidates_before_authoritative_write() {
    let ctx = RequestContext::new();
    let store = Arc::new(MemoryStore::new(1_000));
    let repo = InMemoryRepository::new();
    let (_, _, issue) = seed_issue(&repo, &ctx).await;

    let list_key = collection_key(
        ResourceType::Comment,
        KeyOp::GetAllBelongsTo,
        Some(&issue.id),
        Page::default(),
        &[],
    );
    store.set(&list_key, b"[]", None).await.unwrap();
    store
        .set(&entity_key(&issue.id), b"{}", None)
        .await
        .unwrap();

    let witness = Arc::new(WriteWitness::new(repo, store.clone(), &["comment:*", "issue:*"]));
    let comments = CachedCommentRepository::new(base(store.clone()), witness.clone());

    comments
        .create(&ctx, &issue.id, &Comment::new("LGTM", issue.reporter))
        .await
        .unwrap();

    assert!(witness.surviving().is_empty(), "{:?}", witness.surviving());
    assert!(!store.contains(&list_key).await);
    assert!(!store.contains(&entity_key(&issue.id)).await);
    assert_eq!(witness.writes(), 1);
}

#[tokio::test]
async fn test_document_delete_propagates() {
    let ctx = RequestContext::new();
    let store = Arc::new(MemoryStore::new(1_000));
    let repo = Arc::new(InMemoryRepository::new());
    let user = Id::new(ResourceType::User);
    let namespace = Id::new(ResourceType::Namespace);
    let project = Id::new(ResourceType::Project);
    let document = Document::new("design.md", "file_1", user);
    DocumentRepository::create(repo.as_ref(), &ctx, &user, &document)
        .await
        .unwrap();
    repo.reset_calls();

    let seeded = [
        entity_key(&document.id),
        collection_key(
            ResourceType::Document,
            KeyOp::GetAllBelongsTo,
            Some(&user),
            Page::default(),
            &[],
        ),
        entity_key(&namespace),
        entity_key(&project),
        entity_key(&user),
    ];
    for key in &seeded {
        store.set(key, b"{}", None).await.unwrap();
    }

    let documents = CachedDocumentRepository::new(base(store.clone()), repo.clone());
    documents.delete(&ctx, &document.id).await.unwrap();

    for key in &seeded {
        assert!(!store.contains(key).await, "{key} survived");
    }
    assert_eq!(repo.writes(), 1);
}

#[tokio::test]
async fn test_update_refreshes_single_key() {
    let ctx = RequestContext::new();
    let store = Arc::new(MemoryStore::new(1_000));
    let repo = Arc::new(InMemoryRepository::new());
    let author = Id::new(ResourceType::User);
    let document = Document::new("draft", "file_1", author);
    let documents = CachedDocumentRepository::new(base(store.clone()), repo.clone());
    documents.create(&ctx, &author, &document).await.unwrap();
    documents.get(&ctx, &document.id).await.unwrap();

    let fresh = documents
        .update(&ctx, &document.id, &patch(serde_json::json!({ "name": "final" })))
        .await
        .unwrap();

    repo.reset_calls();
    let cached = documents.get(&ctx, &document.id).await.unwrap();
    assert_eq!(cached, fresh);
    assert_eq!(cached.name, "final");
    assert_eq!(repo.reads(), 0);
}

#[tokio::test]
async fn test_failed_update_leaves_nothing_cached() {
    let ctx = RequestContext::new();
    let store = Arc::new(MemoryStore::new(1_000));
    let repo = Arc::new(InMemoryRepository::new());
    let author = Id::new(ResourceType::User);
    let document = Document::new("draft", "file_1", author);
    let documents = CachedDocumentRepository::new(base(store.clone()), repo.clone());
    documents.create(&ctx, &author, &document).await.unwrap();
    documents.get(&ctx, &document.id).await.unwrap();
    assert!(store.contains(&entity_key(&document.id)).await);

    repo.set_write_failure(Some("disk full")).await;
    let err = documents
        .update(&ctx, &document.id, &patch(serde_json::json!({ "name": "final" })))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RepositoryError::WriteFailed {
            entity_type: "Document",
            operation: WriteOp::Update,
            reason: "disk full".to_string(),
        }
    );
    assert!(!store.contains(&entity_key(&document.id)).await);

    repo.set_write_failure(None).await;
    repo.reset_calls();
    let current = documents.get(&ctx, &document.id).await.unwrap();
    assert_eq!(current.name, "draft");
    assert_eq!(repo.reads(), 1);
}

#[tokio::test]
async fn test_cached_project_matches_authoritative_after_issue_create() {
    let ctx = RequestContext::new();
    let store = Arc::new(MemoryStore::new(1_000));
    let repo = InMemoryRepository::new();
    let (user, project, _) = seed_issue(&repo, &ctx).await;
    let repo = Arc::new(repo);

    let projects = CachedProjectRepository::new(base(store.clone()), repo.clone());
    let issues = CachedIssueRepository::new(base(store.clone()), repo.clone());
    projects.get(&ctx, &project.id).await.unwrap();

    issues
        .create(&ctx, &project.id, &Issue::new(2, IssueKind::Bug, "Flaky", user.id))
        .await
        .unwrap();

    let cached = projects.get(&ctx, &project.id).await.unwrap();
    let stored = ProjectRepository::get(repo.as_ref(), &ctx, &project.id)
        .await
        .unwrap();
    assert_eq!(cached, stored);
}

#[tokio::test]
async fn test_cache_down_fails_reads_without_fallback() {
    let ctx = RequestContext::new();
    let store = Arc::new(FaultyStore::new());
    let repo = Arc::new(InMemoryRepository::new());
    let user = User::new("u1", "a@x");
    UserRepository::create(repo.as_ref(), &ctx, &user)
        .await
        .unwrap();
    repo.reset_calls();
    store
        .fail_get(StoreError::ConnectionFailed("connection refused".into()))
        .await;

    let users = CachedUserRepository::new(base(store.clone()), repo.clone());
    let result = users.get(&ctx, &user.id).await;

    assert!(matches!(
        result,
        Err(RepositoryError::CacheRead(StoreError::ConnectionFailed(_)))
    ));
    assert_eq!(repo.reads(), 0);
}

#[tokio::test]
async fn test_permission_writes_cascade_without_caching_reads() {
    let ctx = RequestContext::new();
    let store = Arc::new(MemoryStore::new(1_000));
    let subject = Id::new(ResourceType::User);
    let target = Id::new(ResourceType::Project);
    for key in [entity_key(&subject), format!("role:GetAllBelongsTo:{target}:0:10")] {
        store.set(&key, b"{}", None).await.unwrap();
    }

    let witness = Arc::new(WriteWitness::new(
        InMemoryRepository::new(),
        store.clone(),
        &["role:*", "user:*"],
    ));
    let permissions = CachedPermissionRepository::new(base(store.clone()), witness.clone());

    permissions
        .create(&ctx, &Permission::new(PermissionKind::Write, subject, target))
        .await
        .unwrap();
    assert!(witness.surviving().is_empty());
    assert_eq!(witness.writes(), 1);

    witness.inner.reset_calls();
    for _ in 0..3 {
        assert_eq!(permissions.get_by_subject(&ctx, &subject).await.unwrap().len(), 1);
    }
    assert_eq!(witness.inner.reads(), 3);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_failed_invalidation_skips_authoritative_write() {
    let ctx = RequestContext::new();
    let store = Arc::new(FaultyStore::new());
    let repo = InMemoryRepository::new();
    let (_, _, issue) = seed_issue(&repo, &ctx).await;
    repo.reset_calls();
    store
        .fail_keys(StoreError::OperationFailed("KEYS timed out".into()))
        .await;

    let witness = Arc::new(WriteWitness::new(repo, Arc::new(MemoryStore::new(10)), &[]));
    let comments = CachedCommentRepository::new(base(store.clone()), witness.clone());
    let result = comments
        .create(&ctx, &issue.id, &Comment::new("LGTM", issue.reporter))
        .await;

    assert!(matches!(
        result,
        Err(RepositoryError::CacheDelete(StoreError::OperationFailed(_)))
    ));
    assert_eq!(witness.writes(), 0);
}

#[tokio::test]
async fn test_authoritative_errors_are_not_cached() {
    let ctx = RequestContext::new();
    let store = Arc::new(MemoryStore::new(1_000));
    let repo = Arc::new(InMemoryRepository::new());
    let users = CachedUserRepository::new(base(store.clone()), repo.clone());
    let missing = Id::new(ResourceType::User);

    let result = users.get(&ctx, &missing).await;

    assert!(result.as_ref().is_err_and(RepositoryError::is_not_found));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_lookup_key_is_dropped_when_the_entity_changes() {
    let ctx = RequestContext::new();
    let store = Arc::new(MemoryStore::new(1_000));
    let repo = InMemoryRepository::new();
    let (_, project, _) = seed_issue(&repo, &ctx).await;
    let repo = Arc::new(repo);

    let projects: CachedProjectRepository<InMemoryRepository> = RepositoryBuilder::new()
        .store(store.clone())
        .repository(repo.clone())
        .build()
        .unwrap();

    assert_eq!(projects.get_by_key(&ctx, "CORE").await.unwrap().name, "Core");
    projects
        .update(&ctx, &project.id, &patch(serde_json::json!({ "name": "Kernel" })))
        .await
        .unwrap();

    assert_eq!(projects.get_by_key(&ctx, "CORE").await.unwrap().name, "Kernel");
}

#[tokio::test]
async fn test_cached_values_expire_with_default_ttl() {
    let ctx = RequestContext::new();
    let store = Arc::new(MemoryStore::new(1_000));
    let repo = Arc::new(InMemoryRepository::new());
    let user = User::new("u1", "a@x");
    UserRepository::create(repo.as_ref(), &ctx, &user)
        .await
        .unwrap();
    repo.reset_calls();

    let users: CachedUserRepository<InMemoryRepository> = RepositoryBuilder::new()
        .store(store.clone())
        .repository(repo.clone())
        .default_ttl(std::time::Duration::from_millis(20))
        .build()
        .unwrap();

    users.get(&ctx, &user.id).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(40)).await;
    users.get(&ctx, &user.id).await.unwrap();

    assert_eq!(repo.reads(), 2);
}
