mod types;

pub use types::{
    Assignment, AssignmentKind, Attachment, Comment, Document, Issue, IssueKind, IssuePriority,
    IssueStatus, Label, Namespace, Notification, Organization, OrganizationStatus, Permission,
    PermissionKind, Project, ProjectStatus, Role, Todo, TodoPriority, User, UserStatus,
};
