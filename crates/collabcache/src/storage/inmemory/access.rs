//! Roles, permissions and per-user items.

use async_trait::async_trait;
use chrono::Utc;

use collabcache_core::cache::WriteOp;
use collabcache_core::domain::{Notification, Permission, PermissionKind, Role, Todo};
use collabcache_core::storage::{
    NotificationRepository, Page, Patch, PermissionRepository, RepositoryError, Result,
    RoleRepository, TodoRepository,
};
use collabcache_core::{Id, RequestContext, ResourceType};

use super::repository::{
    apply_patch, find, find_mut, insert_new, page_of, push_unique, remove, InMemoryRepository,
    Tables,
};

const ROLE: &str = "Role";
const PERMISSION: &str = "Permission";
const TODO: &str = "Todo";
const NOTIFICATION: &str = "Notification";

impl Tables {
    /// The role `id`, provided it belongs to `belongs_to`.
    fn scoped_role(&mut self, id: &Id, belongs_to: &Id) -> Result<&mut Role> {
        if !self.parent_is(id, belongs_to) {
            return Err(RepositoryError::not_found(ROLE, id));
        }
        find_mut(&mut self.roles, ROLE, id)
    }

    /// The notification `id`, provided it was sent to `recipient`.
    fn addressed_notification(&mut self, id: &Id, recipient: &Id) -> Result<&mut Notification> {
        match self.notifications.get_mut(id) {
            Some(notification) if notification.recipient == *recipient => Ok(notification),
            _ => Err(RepositoryError::not_found(NOTIFICATION, id)),
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRepository {
    async fn create(
        &self,
        _ctx: &RequestContext,
        _created_by: &Id,
        belongs_to: &Id,
        role: &Role,
    ) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ROLE, WriteOp::Create)?;

        let parent_exists = match belongs_to.kind() {
            ResourceType::Organization => tables.organizations.contains_key(belongs_to),
            ResourceType::Project => tables.projects.contains_key(belongs_to),
            other => {
                return Err(RepositoryError::InvalidData(format!(
                    "roles cannot belong to a {other}"
                )))
            }
        };
        if !parent_exists {
            return Err(RepositoryError::not_found("Parent", belongs_to));
        }

        let mut created = role.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.roles, ROLE, role.id, created)?;
        tables.parents.insert(role.id, *belongs_to);
        Ok(())
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Role> {
        self.count_read();
        find(&self.tables.read().await.roles, ROLE, id)
    }

    async fn get_all_belongs_to(
        &self,
        _ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Role>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.roles, page, |r| {
            tables.parent_is(&r.id, belongs_to)
        }))
    }

    async fn update(&self, _ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Role> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ROLE, WriteOp::Update)?;

        let role = find_mut(&mut tables.roles, ROLE, id)?;
        *role = apply_patch(role, patch)?;
        Ok(role.clone())
    }

    async fn add_member(
        &self,
        _ctx: &RequestContext,
        role: &Id,
        member: &Id,
        belongs_to: &Id,
    ) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ROLE, WriteOp::AddMember)?;

        if !tables.users.contains_key(member) {
            return Err(RepositoryError::not_found("User", member));
        }
        push_unique(&mut tables.scoped_role(role, belongs_to)?.members, *member);
        Ok(())
    }

    async fn remove_member(
        &self,
        _ctx: &RequestContext,
        role: &Id,
        member: &Id,
        belongs_to: &Id,
    ) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ROLE, WriteOp::RemoveMember)?;

        tables
            .scoped_role(role, belongs_to)?
            .members
            .retain(|m| m != member);
        Ok(())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id, belongs_to: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ROLE, WriteOp::Delete)?;

        tables.scoped_role(id, belongs_to)?;
        remove(&mut tables.roles, ROLE, id)?;
        tables.parents.remove(id);
        Ok(())
    }
}

#[async_trait]
impl PermissionRepository for InMemoryRepository {
    async fn create(&self, _ctx: &RequestContext, permission: &Permission) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(PERMISSION, WriteOp::Create)?;

        let mut created = permission.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.permissions, PERMISSION, permission.id, created)?;

        if let Some(role) = tables.roles.get_mut(&permission.subject) {
            push_unique(&mut role.permissions, permission.id);
        }
        Ok(())
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Permission> {
        self.count_read();
        find(&self.tables.read().await.permissions, PERMISSION, id)
    }

    async fn get_by_subject(&self, _ctx: &RequestContext, subject: &Id) -> Result<Vec<Permission>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(tables
            .permissions
            .values()
            .filter(|p| p.subject == *subject)
            .cloned()
            .collect())
    }

    async fn get_by_target(&self, _ctx: &RequestContext, target: &Id) -> Result<Vec<Permission>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(tables
            .permissions
            .values()
            .filter(|p| p.target == *target)
            .cloned()
            .collect())
    }

    async fn get_by_subject_and_target(
        &self,
        _ctx: &RequestContext,
        subject: &Id,
        target: &Id,
    ) -> Result<Vec<Permission>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(tables
            .permissions
            .values()
            .filter(|p| p.subject == *subject && p.target == *target)
            .cloned()
            .collect())
    }

    async fn has_permission(
        &self,
        _ctx: &RequestContext,
        subject: &Id,
        target: &Id,
        kinds: &[PermissionKind],
    ) -> Result<bool> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(tables.permissions.values().any(|p| {
            p.subject == *subject && p.target == *target && kinds.iter().any(|k| p.kind.grants(*k))
        }))
    }

    async fn update(
        &self,
        _ctx: &RequestContext,
        id: &Id,
        kind: PermissionKind,
    ) -> Result<Permission> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(PERMISSION, WriteOp::Update)?;

        let permission = find_mut(&mut tables.permissions, PERMISSION, id)?;
        permission.kind = kind;
        permission.updated_at = Some(Utc::now());
        Ok(permission.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(PERMISSION, WriteOp::Delete)?;

        let permission = remove(&mut tables.permissions, PERMISSION, id)?;
        if let Some(role) = tables.roles.get_mut(&permission.subject) {
            role.permissions.retain(|p| p != id);
        }
        Ok(())
    }
}

#[async_trait]
impl TodoRepository for InMemoryRepository {
    async fn create(&self, _ctx: &RequestContext, todo: &Todo) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(TODO, WriteOp::Create)?;

        let mut created = todo.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.todos, TODO, todo.id, created)
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Todo> {
        self.count_read();
        find(&self.tables.read().await.todos, TODO, id)
    }

    async fn get_by_owner(
        &self,
        _ctx: &RequestContext,
        owner: &Id,
        completed: Option<bool>,
        page: Page,
    ) -> Result<Vec<Todo>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.todos, page, |t| {
            t.owned_by == *owner && completed.map_or(true, |c| t.completed == c)
        }))
    }

    async fn update(&self, _ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Todo> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(TODO, WriteOp::Update)?;

        let todo = find_mut(&mut tables.todos, TODO, id)?;
        *todo = apply_patch(todo, patch)?;
        Ok(todo.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(TODO, WriteOp::Delete)?;

        remove(&mut tables.todos, TODO, id).map(|_| ())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryRepository {
    async fn create(&self, _ctx: &RequestContext, notification: &Notification) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(NOTIFICATION, WriteOp::Create)?;

        let mut created = notification.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(
            &mut tables.notifications,
            NOTIFICATION,
            notification.id,
            created,
        )
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id, recipient: &Id) -> Result<Notification> {
        self.count_read();
        let tables = self.tables.read().await;
        tables
            .notifications
            .get(id)
            .filter(|n| n.recipient == *recipient)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(NOTIFICATION, id))
    }

    async fn get_all_by_recipient(
        &self,
        _ctx: &RequestContext,
        recipient: &Id,
        page: Page,
    ) -> Result<Vec<Notification>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.notifications, page, |n| {
            n.recipient == *recipient
        }))
    }

    async fn update(
        &self,
        _ctx: &RequestContext,
        id: &Id,
        recipient: &Id,
        patch: &Patch,
    ) -> Result<Notification> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(NOTIFICATION, WriteOp::Update)?;

        let notification = tables.addressed_notification(id, recipient)?;
        *notification = apply_patch(notification, patch)?;
        Ok(notification.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id, recipient: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(NOTIFICATION, WriteOp::Delete)?;

        tables.addressed_notification(id, recipient)?;
        remove(&mut tables.notifications, NOTIFICATION, id).map(|_| ())
    }
}
