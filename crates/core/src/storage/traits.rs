//! Authoritative repository contracts.
//!
//! The cached repositories in `collabcache` implement these same traits by
//! wrapping an authoritative implementation, so callers cannot tell whether
//! they hold the cached or the raw variant.

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::domain::{
    Assignment, Attachment, Comment, Document, Issue, Label, Namespace, Notification,
    Organization, Permission, PermissionKind, Project, Role, Todo, User,
};
use crate::id::Id;

use super::{Page, Patch, Result};

/// Repository for user operations.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, ctx: &RequestContext, user: &User) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<User>;

    /// Gets a user by their email address.
    async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> Result<User>;

    async fn get_all(&self, ctx: &RequestContext, page: Page) -> Result<Vec<User>>;

    /// Applies `patch` and returns the updated user.
    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<User>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for organization operations.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Creates an organization owned by `owner`.
    async fn create(
        &self,
        ctx: &RequestContext,
        owner: &Id,
        organization: &Organization,
    ) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Organization>;

    async fn get_all(&self, ctx: &RequestContext, page: Page) -> Result<Vec<Organization>>;

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Organization>;

    async fn add_member(&self, ctx: &RequestContext, organization: &Id, member: &Id)
        -> Result<()>;

    async fn remove_member(
        &self,
        ctx: &RequestContext,
        organization: &Id,
        member: &Id,
    ) -> Result<()>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for namespace operations.
#[async_trait]
pub trait NamespaceRepository: Send + Sync {
    async fn create(
        &self,
        ctx: &RequestContext,
        organization: &Id,
        namespace: &Namespace,
    ) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Namespace>;

    /// Gets the namespaces of an organization.
    async fn get_all(
        &self,
        ctx: &RequestContext,
        organization: &Id,
        page: Page,
    ) -> Result<Vec<Namespace>>;

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Namespace>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for project operations.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, ctx: &RequestContext, namespace: &Id, project: &Project) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Project>;

    /// Gets a project by its short key.
    async fn get_by_key(&self, ctx: &RequestContext, key: &str) -> Result<Project>;

    /// Gets the projects of a namespace.
    async fn get_all(
        &self,
        ctx: &RequestContext,
        namespace: &Id,
        page: Page,
    ) -> Result<Vec<Project>>;

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Project>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for document operations.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Creates a document attached to `belongs_to` (namespace, project or user).
    async fn create(&self, ctx: &RequestContext, belongs_to: &Id, document: &Document)
        -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Document>;

    async fn get_by_creator(
        &self,
        ctx: &RequestContext,
        created_by: &Id,
        page: Page,
    ) -> Result<Vec<Document>>;

    async fn get_all_belongs_to(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Document>>;

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Document>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for issue operations.
#[async_trait]
pub trait IssueRepository: Send + Sync {
    async fn create(&self, ctx: &RequestContext, project: &Id, issue: &Issue) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Issue>;

    /// Gets the issues of a project.
    async fn get_all_belongs_to(
        &self,
        ctx: &RequestContext,
        project: &Id,
        page: Page,
    ) -> Result<Vec<Issue>>;

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Issue>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for comment operations.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Creates a comment on `belongs_to` (an issue or a document).
    async fn create(&self, ctx: &RequestContext, belongs_to: &Id, comment: &Comment)
        -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Comment>;

    async fn get_all_belongs_to(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Comment>>;

    /// Replaces the comment content.
    async fn update(&self, ctx: &RequestContext, id: &Id, content: &str) -> Result<Comment>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for attachment operations.
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    async fn create(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        attachment: &Attachment,
    ) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Attachment>;

    async fn get_all_belongs_to(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Attachment>>;

    /// Renames the attachment.
    async fn update(&self, ctx: &RequestContext, id: &Id, name: &str) -> Result<Attachment>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for assignment operations.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn create(&self, ctx: &RequestContext, assignment: &Assignment) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Assignment>;

    /// Gets the assignments of a user.
    async fn get_by_user(
        &self,
        ctx: &RequestContext,
        user: &Id,
        page: Page,
    ) -> Result<Vec<Assignment>>;

    /// Gets the assignments on a resource.
    async fn get_by_resource(
        &self,
        ctx: &RequestContext,
        resource: &Id,
        page: Page,
    ) -> Result<Vec<Assignment>>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for label operations.
#[async_trait]
pub trait LabelRepository: Send + Sync {
    async fn create(&self, ctx: &RequestContext, label: &Label) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Label>;

    async fn get_all(&self, ctx: &RequestContext, page: Page) -> Result<Vec<Label>>;

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Label>;

    /// Attaches the label to a document or an issue.
    async fn attach_to(&self, ctx: &RequestContext, label: &Id, target: &Id) -> Result<()>;

    async fn detach_from(&self, ctx: &RequestContext, label: &Id, target: &Id) -> Result<()>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for role operations.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Creates a role on `belongs_to` (an organization or a project).
    async fn create(
        &self,
        ctx: &RequestContext,
        created_by: &Id,
        belongs_to: &Id,
        role: &Role,
    ) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Role>;

    async fn get_all_belongs_to(
        &self,
        ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Role>>;

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Role>;

    async fn add_member(
        &self,
        ctx: &RequestContext,
        role: &Id,
        member: &Id,
        belongs_to: &Id,
    ) -> Result<()>;

    async fn remove_member(
        &self,
        ctx: &RequestContext,
        role: &Id,
        member: &Id,
        belongs_to: &Id,
    ) -> Result<()>;

    async fn delete(&self, ctx: &RequestContext, id: &Id, belongs_to: &Id) -> Result<()>;
}

/// Repository for permission operations.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn create(&self, ctx: &RequestContext, permission: &Permission) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Permission>;

    async fn get_by_subject(&self, ctx: &RequestContext, subject: &Id) -> Result<Vec<Permission>>;

    async fn get_by_target(&self, ctx: &RequestContext, target: &Id) -> Result<Vec<Permission>>;

    async fn get_by_subject_and_target(
        &self,
        ctx: &RequestContext,
        subject: &Id,
        target: &Id,
    ) -> Result<Vec<Permission>>;

    /// Returns true if `subject` holds any of `kinds` on `target`.
    async fn has_permission(
        &self,
        ctx: &RequestContext,
        subject: &Id,
        target: &Id,
        kinds: &[PermissionKind],
    ) -> Result<bool>;

    async fn update(
        &self,
        ctx: &RequestContext,
        id: &Id,
        kind: PermissionKind,
    ) -> Result<Permission>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for todo operations.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn create(&self, ctx: &RequestContext, todo: &Todo) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id) -> Result<Todo>;

    /// Gets the todos of an owner, optionally filtered by completion.
    async fn get_by_owner(
        &self,
        ctx: &RequestContext,
        owner: &Id,
        completed: Option<bool>,
        page: Page,
    ) -> Result<Vec<Todo>>;

    async fn update(&self, ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Todo>;

    async fn delete(&self, ctx: &RequestContext, id: &Id) -> Result<()>;
}

/// Repository for notification operations.
///
/// Single reads and writes are always scoped to the recipient.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, ctx: &RequestContext, notification: &Notification) -> Result<()>;

    async fn get(&self, ctx: &RequestContext, id: &Id, recipient: &Id) -> Result<Notification>;

    async fn get_all_by_recipient(
        &self,
        ctx: &RequestContext,
        recipient: &Id,
        page: Page,
    ) -> Result<Vec<Notification>>;

    async fn update(
        &self,
        ctx: &RequestContext,
        id: &Id,
        recipient: &Id,
        patch: &Patch,
    ) -> Result<Notification>;

    async fn delete(&self, ctx: &RequestContext, id: &Id, recipient: &Id) -> Result<()>;
}
