//! Cached notification repository decorator.

use std::sync::Arc;

use async_trait::async_trait;

use collabcache_core::cache::{
    collection_key, discriminated_entity_key, InvalidationRequest, KeyOp, WriteOp,
};
use collabcache_core::domain::Notification;
use collabcache_core::storage::{NotificationRepository, Page, Patch, Result};
use collabcache_core::{Id, RequestContext, ResourceType};

use crate::cache::BaseCacheRepository;
use crate::options::CachedRepository;

/// Cached notification repository decorator.
///
/// Notifications are only ever read for their recipient, so the single-entity
/// key carries it: `notification:<id>:<recipient>`.
pub struct CachedNotificationRepository<R: ?Sized> {
    base: BaseCacheRepository,
    repository: Arc<R>,
}

impl<R: ?Sized> CachedNotificationRepository<R> {
    pub fn new(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self { base, repository }
    }

    fn scoped_request(op: WriteOp, id: &Id, recipient: &Id) -> InvalidationRequest {
        InvalidationRequest::new(ResourceType::Notification, op)
            .scope(KeyOp::GetByRecipient, recipient)
            .key(discriminated_entity_key(id, recipient))
    }
}

impl<R: ?Sized> CachedRepository for CachedNotificationRepository<R> {
    type Inner = R;

    fn from_parts(base: BaseCacheRepository, repository: Arc<R>) -> Self {
        Self::new(base, repository)
    }
}

#[async_trait]
impl<R> NotificationRepository for CachedNotificationRepository<R>
where
    R: NotificationRepository + ?Sized + 'static,
{
    async fn create(&self, ctx: &RequestContext, notification: &Notification) -> Result<()> {
        let request =
            Self::scoped_request(WriteOp::Create, &notification.id, &notification.recipient);
        self.base
            .write(ctx, &request, self.repository.create(ctx, notification))
            .await
    }

    async fn get(&self, ctx: &RequestContext, id: &Id, recipient: &Id) -> Result<Notification> {
        let key = discriminated_entity_key(id, recipient);
        self.base
            .read_through(ctx, &key, self.repository.get(ctx, id, recipient))
            .await
    }

    async fn get_all_by_recipient(
        &self,
        ctx: &RequestContext,
        recipient: &Id,
        page: Page,
    ) -> Result<Vec<Notification>> {
        let key = collection_key(
            ResourceType::Notification,
            KeyOp::GetByRecipient,
            Some(recipient),
            page,
            &[],
        );
        self.base
            .read_through(
                ctx,
                &key,
                self.repository.get_all_by_recipient(ctx, recipient, page),
            )
            .await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: &Id,
        recipient: &Id,
        patch: &Patch,
    ) -> Result<Notification> {
        let key = discriminated_entity_key(id, recipient);
        let request = Self::scoped_request(WriteOp::Update, id, recipient);
        self.base
            .update(
                ctx,
                &request,
                &key,
                self.repository.update(ctx, id, recipient, patch),
            )
            .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &Id, recipient: &Id) -> Result<()> {
        let request = Self::scoped_request(WriteOp::Delete, id, recipient);
        self.base
            .write(ctx, &request, self.repository.delete(ctx, id, recipient))
            .await
    }
}
