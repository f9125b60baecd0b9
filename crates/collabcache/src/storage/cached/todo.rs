//! Cached todo repository decorator.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{
    collection_key, entity_key, InvalidationRequest, KeyFragment, KeyOp, WriteOp,
};
use collabcache_core::domain::Todo;
use collabcache_core::storage::{Page, Patch, Result, TodoRepository};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Key discriminator for the completion filter of an owner's list.
fn completion(completed: Option<bool>) -> KeyFragment {
    match completed {
        Some(completed) => KeyFragment::from(completed),
        None => KeyFragment::from("all"),
    }
}

/// Cached todo repository decorator.
///
/// Owner lists are keyed
/// `todo:GetByOwner:<owner>:<offset>:<limit>:<all|true|false>`.
pub struct CachedTodoRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedTodoRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }
}

impl<R: ?Sized> CachedRepository for CachedTodoRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> TodoRepository for CachedTodoRepository<R>
where
    R: TodoRepository + ?Sized + 'static,
{
    async fn create(&self, ctx: &RequestContext, todo: &Todo) -> Result<()> {
        let request = InvalidationRequest::new(ResourceType::Todo, WriteOp::Create)
            .scope(KeyOp::GetByOwner, &todo.owned_by);
        self.base
            .write(ctx, &request, self.repository.create(ctx, todo))
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Todo> {
        self.base
            .read_through(ctx, &entity_key(id), self.repository.get(ctx, id))
            .await
    }

    async fn get_by_owner(
        &self,
        ctx: &RequestContext,
        owner: &Id,
        completed: Option<bool>,
        page: Page,
    ) -> Result<Vec<Todo>> {
        let key = collection_key(
            ResourceType::Todo,
            KeyOp::GetByOwner,
            Some(owner),
            page,
            &[completion(completed)],
        );
        self.base
            .read_through(
                ctx,
                &key,
                self.repository.get_by_owner(ctx, owner, completed, page),
            )
            .await
    }

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Todo> {
        let key = entity_key(id);
        let request = InvalidationRequest::new(ResourceType::Todo, WriteOp::Update).key(&key);
        self.base
            .update(ctx, &request, &key, self.repository.update(ctx, id, patch))
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()> {
        let request =
            InvalidationRequest::new(ResourceType::Todo, WriteOp::Delete).key(entity_key(id));
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id))
            .await
    }
}
