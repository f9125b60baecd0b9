use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{Id, ResourceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
    Pending,
    Deleted,
}

/// A person using the collaboration product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: UserStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Id::new(ResourceType::User),
            username: username.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            status: UserStatus::Active,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this user (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStatus {
    Active,
    Deleted,
}

/// A group of users owning namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub website: Option<String>,
    pub status: OrganizationStatus,
    pub members: Vec<Id>,
    pub namespaces: Vec<Id>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Organization {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Id::new(ResourceType::Organization),
            name: name.into(),
            email: email.into(),
            website: None,
            status: OrganizationStatus::Active,
            members: Vec::new(),
            namespaces: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this organization (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

/// A container for projects and documents inside an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub projects: Vec<Id>,
    pub documents: Vec<Id>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Id::new(ResourceType::Namespace),
            name: name.into(),
            description: None,
            projects: Vec::new(),
            documents: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this namespace (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Archived,
}

/// A project. `key` is a short human readable handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub status: ProjectStatus,
    pub teams: Vec<Id>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Id::new(ResourceType::Project),
            key: key.into(),
            name: name.into(),
            description: None,
            logo: None,
            status: ProjectStatus::Active,
            teams: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this project (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

/// A document attached to a namespace, project or user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Id,
    pub name: String,
    pub excerpt: Option<String>,
    pub file_id: String,
    pub created_by: Id,
    pub labels: Vec<Id>,
    pub comments: Vec<Id>,
    pub attachments: Vec<Id>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(name: impl Into<String>, file_id: impl Into<String>, created_by: Id) -> Self {
        Self {
            id: Id::new(ResourceType::Document),
            name: name.into(),
            excerpt: None,
            file_id: file_id.into(),
            created_by,
            labels: Vec::new(),
            comments: Vec::new(),
            attachments: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this document (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Epic,
    Story,
    Task,
    Bug,
    SubTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Blocked,
    Review,
    Done,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    Low,
    Medium,
    High,
    Urgent,
    Critical,
}

/// A unit of work inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: Id,
    pub numeric_id: u64,
    pub parent: Option<Id>,
    pub kind: IssueKind,
    pub title: String,
    pub description: Option<String>,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub reporter: Id,
    pub assignees: Vec<Id>,
    pub comments: Vec<Id>,
    pub attachments: Vec<Id>,
    pub watchers: Vec<Id>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Issue {
    pub fn new(numeric_id: u64, kind: IssueKind, title: impl Into<String>, reporter: Id) -> Self {
        Self {
            id: Id::new(ResourceType::Issue),
            numeric_id,
            parent: None,
            kind,
            title: title.into(),
            description: None,
            status: IssueStatus::Open,
            priority: IssuePriority::Medium,
            reporter,
            assignees: Vec::new(),
            comments: Vec::new(),
            attachments: Vec::new(),
            watchers: Vec::new(),
            due_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this issue (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

/// A comment on an issue or a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub content: String,
    pub created_by: Id,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn new(content: impl Into<String>, created_by: Id) -> Self {
        Self {
            id: Id::new(ResourceType::Comment),
            content: content.into(),
            created_by,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this comment (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

/// A file attached to an issue or a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Id,
    pub name: String,
    pub file_id: String,
    pub created_by: Id,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, file_id: impl Into<String>, created_by: Id) -> Self {
        Self {
            id: Id::new(ResourceType::Attachment),
            name: name.into(),
            file_id: file_id.into(),
            created_by,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this attachment (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    Assignee,
    Reviewer,
}

/// Links a user to a resource they are responsible for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Id,
    pub kind: AssignmentKind,
    pub user: Id,
    pub resource: Id,
    pub created_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn new(kind: AssignmentKind, user: Id, resource: Id) -> Self {
        Self {
            id: Id::new(ResourceType::Assignment),
            kind,
            user,
            resource,
            created_at: None,
        }
    }

    /// Sets a specific ID for this assignment (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

/// A tag that can be attached to documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Id::new(ResourceType::Label),
            name: name.into(),
            description: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this label (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

/// A named set of members and permissions scoped to an organization or project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<Id>,
    pub permissions: Vec<Id>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Id::new(ResourceType::Role),
            name: name.into(),
            description: None,
            members: Vec::new(),
            permissions: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this role (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    All,
    Create,
    Read,
    Write,
    Delete,
}

impl PermissionKind {
    /// Returns true if holding `self` grants `requested`.
    pub fn grants(&self, requested: PermissionKind) -> bool {
        *self == PermissionKind::All || *self == requested
    }
}

/// Grants `subject` a kind of access to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: Id,
    pub kind: PermissionKind,
    pub subject: Id,
    pub target: Id,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Permission {
    pub fn new(kind: PermissionKind, subject: Id, target: Id) -> Self {
        Self {
            id: Id::new(ResourceType::Permission),
            kind,
            subject,
            target,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this permission (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoPriority {
    Normal,
    Important,
    Urgent,
    Critical,
}

/// A personal todo item owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub priority: TodoPriority,
    pub completed: bool,
    pub owned_by: Id,
    pub created_by: Id,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn new(title: impl Into<String>, owned_by: Id, created_by: Id) -> Self {
        Self {
            id: Id::new(ResourceType::Todo),
            title: title.into(),
            description: None,
            priority: TodoPriority::Normal,
            completed: false,
            owned_by,
            created_by,
            due_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this todo (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

/// A message delivered to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub recipient: Id,
    pub read: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(title: impl Into<String>, recipient: Id) -> Self {
        Self {
            id: Id::new(ResourceType::Notification),
            title: title.into(),
            description: None,
            recipient,
            read: false,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets a specific ID for this notification (useful for testing).
    pub fn with_id(mut self, id: Id) -> Self {
        self.id = id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_allocate_typed_ids() {
        let user = User::new("jdoe", "jdoe@example.com");
        assert_eq!(user.id.kind(), ResourceType::User);

        let doc = Document::new("Spec", "file-1", user.id);
        assert_eq!(doc.id.kind(), ResourceType::Document);
        assert_eq!(doc.created_by, user.id);

        let todo = Todo::new("Write docs", user.id, user.id);
        assert_eq!(todo.id.kind(), ResourceType::Todo);
        assert!(!todo.completed);
    }

    #[test]
    fn test_permission_all_grants_everything() {
        assert!(PermissionKind::All.grants(PermissionKind::Delete));
        assert!(PermissionKind::Read.grants(PermissionKind::Read));
        assert!(!PermissionKind::Read.grants(PermissionKind::Write));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&IssueStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
