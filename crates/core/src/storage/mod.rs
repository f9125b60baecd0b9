mod error;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use traits::{
    AssignmentRepository, AttachmentRepository, CommentRepository, DocumentRepository,
    IssueRepository, LabelRepository, NamespaceRepository, NotificationRepository,
    OrganizationRepository, PermissionRepository, ProjectRepository, RoleRepository,
    TodoRepository, UserRepository,
};
pub use types::{Page, Patch};
