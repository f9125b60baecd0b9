//! Documents, issues and what hangs off them.

use async_trait::async_trait;
use chrono::Utc;

use collabcache_core::cache::WriteOp;
use collabcache_core::domain::{Assignment, Attachment, Comment, Document, Issue, Label};
use collabcache_core::storage::{
    AssignmentRepository, AttachmentRepository, CommentRepository, DocumentRepository,
    IssueRepository, LabelRepository, Page, Patch, RepositoryError, Result,
};
use collabcache_core::{Id, RequestContext, ResourceType};

use super::repository::{
    apply_patch, find, find_mut, insert_new, page_of, push_unique, remove, InMemoryRepository,
    Tables,
};

const DOCUMENT: &str = "Document";
const ISSUE: &str = "Issue";
const COMMENT: &str = "Comment";
const ATTACHMENT: &str = "Attachment";
const ASSIGNMENT: &str = "Assignment";
const LABEL: &str = "Label";

/// The list on an issue or a document that a child entity is linked into.
fn child_list<'a>(
    tables: &'a mut Tables,
    parent: &Id,
    pick: fn(&mut Issue) -> &mut Vec<Id>,
    pick_document: fn(&mut Document) -> &mut Vec<Id>,
) -> Result<&'a mut Vec<Id>> {
    match parent.kind() {
        ResourceType::Issue => Ok(pick(find_mut(&mut tables.issues, ISSUE, parent)?)),
        ResourceType::Document => Ok(pick_document(find_mut(
            &mut tables.documents,
            DOCUMENT,
            parent,
        )?)),
        other => Err(RepositoryError::InvalidData(format!(
            "{other} cannot hold comments or attachments"
        ))),
    }
}

fn comments_of<'a>(tables: &'a mut Tables, parent: &Id) -> Result<&'a mut Vec<Id>> {
    child_list(tables, parent, |i| &mut i.comments, |d| &mut d.comments)
}

fn attachments_of<'a>(tables: &'a mut Tables, parent: &Id) -> Result<&'a mut Vec<Id>> {
    child_list(tables, parent, |i| &mut i.attachments, |d| &mut d.attachments)
}

/// Labels hang off documents only.
fn labels_of<'a>(tables: &'a mut Tables, target: &Id) -> Result<&'a mut Vec<Id>> {
    match target.kind() {
        ResourceType::Document => {
            Ok(&mut find_mut(&mut tables.documents, DOCUMENT, target)?.labels)
        }
        other => Err(RepositoryError::InvalidData(format!(
            "labels cannot be attached to {other}"
        ))),
    }
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    async fn create(
        &self,
        _ctx: &RequestContext,
        belongs_to: &Id,
        document: &Document,
    ) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(DOCUMENT, WriteOp::Create)?;

        let mut created = document.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.documents, DOCUMENT, document.id, created)?;
        tables.parents.insert(document.id, *belongs_to);

        if let Some(namespace) = tables.namespaces.get_mut(belongs_to) {
            push_unique(&mut namespace.documents, document.id);
        }
        Ok(())
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Document> {
        self.count_read();
        find(&self.tables.read().await.documents, DOCUMENT, id)
    }

    async fn get_by_creator(
        &self,
        _ctx: &RequestContext,
        created_by: &Id,
        page: Page,
    ) -> Result<Vec<Document>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.documents, page, |d| d.created_by == *created_by))
    }

    async fn get_all_belongs_to(
        &self,
        _ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Document>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.documents, page, |d| {
            tables.parent_is(&d.id, belongs_to)
        }))
    }

    async fn update(&self, _ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Document> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(DOCUMENT, WriteOp::Update)?;

        let document = find_mut(&mut tables.documents, DOCUMENT, id)?;
        *document = apply_patch(document, patch)?;
        Ok(document.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(DOCUMENT, WriteOp::Delete)?;

        remove(&mut tables.documents, DOCUMENT, id)?;
        if let Some(parent) = tables.parents.remove(id) {
            if let Some(namespace) = tables.namespaces.get_mut(&parent) {
                namespace.documents.retain(|d| d != id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl IssueRepository for InMemoryRepository {
    async fn create(&self, _ctx: &RequestContext, project: &Id, issue: &Issue) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ISSUE, WriteOp::Create)?;

        if !tables.projects.contains_key(project) {
            return Err(RepositoryError::not_found("Project", project));
        }

        let mut created = issue.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.issues, ISSUE, issue.id, created)?;
        tables.parents.insert(issue.id, *project);
        Ok(())
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Issue> {
        self.count_read();
        find(&self.tables.read().await.issues, ISSUE, id)
    }

    async fn get_all_belongs_to(
        &self,
        _ctx: &RequestContext,
        project: &Id,
        page: Page,
    ) -> Result<Vec<Issue>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.issues, page, |i| {
            tables.parent_is(&i.id, project)
        }))
    }

    async fn update(&self, _ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Issue> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ISSUE, WriteOp::Update)?;

        let issue = find_mut(&mut tables.issues, ISSUE, id)?;
        *issue = apply_patch(issue, patch)?;
        Ok(issue.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ISSUE, WriteOp::Delete)?;

        remove(&mut tables.issues, ISSUE, id)?;
        tables.parents.remove(id);
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryRepository {
    async fn create(
        &self,
        _ctx: &RequestContext,
        belongs_to: &Id,
        comment: &Comment,
    ) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(COMMENT, WriteOp::Create)?;

        comments_of(&mut tables, belongs_to)?;
        let mut created = comment.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.comments, COMMENT, comment.id, created)?;
        tables.parents.insert(comment.id, *belongs_to);

        push_unique(comments_of(&mut tables, belongs_to)?, comment.id);
        Ok(())
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Comment> {
        self.count_read();
        find(&self.tables.read().await.comments, COMMENT, id)
    }

    async fn get_all_belongs_to(
        &self,
        _ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Comment>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.comments, page, |c| {
            tables.parent_is(&c.id, belongs_to)
        }))
    }

    async fn update(&self, _ctx: &RequestContext, id: &Id, content: &str) -> Result<Comment> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(COMMENT, WriteOp::Update)?;

        let comment = find_mut(&mut tables.comments, COMMENT, id)?;
        comment.content = content.to_string();
        comment.updated_at = Some(Utc::now());
        Ok(comment.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(COMMENT, WriteOp::Delete)?;

        remove(&mut tables.comments, COMMENT, id)?;
        if let Some(parent) = tables.parents.remove(id) {
            if let Ok(comments) = comments_of(&mut tables, &parent) {
                comments.retain(|c| c != id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryRepository {
    async fn create(
        &self,
        _ctx: &RequestContext,
        belongs_to: &Id,
        attachment: &Attachment,
    ) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ATTACHMENT, WriteOp::Create)?;

        attachments_of(&mut tables, belongs_to)?;
        let mut created = attachment.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.attachments, ATTACHMENT, attachment.id, created)?;
        tables.parents.insert(attachment.id, *belongs_to);

        push_unique(attachments_of(&mut tables, belongs_to)?, attachment.id);
        Ok(())
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Attachment> {
        self.count_read();
        find(&self.tables.read().await.attachments, ATTACHMENT, id)
    }

    async fn get_all_belongs_to(
        &self,
        _ctx: &RequestContext,
        belongs_to: &Id,
        page: Page,
    ) -> Result<Vec<Attachment>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.attachments, page, |a| {
            tables.parent_is(&a.id, belongs_to)
        }))
    }

    async fn update(&self, _ctx: &RequestContext, id: &Id, name: &str) -> Result<Attachment> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ATTACHMENT, WriteOp::Update)?;

        let attachment = find_mut(&mut tables.attachments, ATTACHMENT, id)?;
        attachment.name = name.to_string();
        attachment.updated_at = Some(Utc::now());
        Ok(attachment.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ATTACHMENT, WriteOp::Delete)?;

        remove(&mut tables.attachments, ATTACHMENT, id)?;
        if let Some(parent) = tables.parents.remove(id) {
            if let Ok(attachments) = attachments_of(&mut tables, &parent) {
                attachments.retain(|a| a != id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryRepository {
    async fn create(&self, _ctx: &RequestContext, assignment: &Assignment) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ASSIGNMENT, WriteOp::Create)?;

        let mut created = assignment.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.assignments, ASSIGNMENT, assignment.id, created)
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Assignment> {
        self.count_read();
        find(&self.tables.read().await.assignments, ASSIGNMENT, id)
    }

    async fn get_by_user(
        &self,
        _ctx: &RequestContext,
        user: &Id,
        page: Page,
    ) -> Result<Vec<Assignment>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.assignments, page, |a| a.user == *user))
    }

    async fn get_by_resource(
        &self,
        _ctx: &RequestContext,
        resource: &Id,
        page: Page,
    ) -> Result<Vec<Assignment>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.assignments, page, |a| a.resource == *resource))
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ASSIGNMENT, WriteOp::Delete)?;

        remove(&mut tables.assignments, ASSIGNMENT, id).map(|_| ())
    }
}

#[async_trait]
impl LabelRepository for InMemoryRepository {
    async fn create(&self, _ctx: &RequestContext, label: &Label) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(LABEL, WriteOp::Create)?;

        let mut created = label.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.labels, LABEL, label.id, created)
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Label> {
        self.count_read();
        find(&self.tables.read().await.labels, LABEL, id)
    }

    async fn get_all(&self, _ctx: &RequestContext, page: Page) -> Result<Vec<Label>> {
        self.count_read();
        Ok(page_of(&self.tables.read().await.labels, page, |_| true))
    }

    async fn update(&self, _ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Label> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(LABEL, WriteOp::Update)?;

        let label = find_mut(&mut tables.labels, LABEL, id)?;
        *label = apply_patch(label, patch)?;
        Ok(label.clone())
    }

    async fn attach_to(&self, _ctx: &RequestContext, label: &Id, target: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(LABEL, WriteOp::AttachTo)?;

        if !tables.labels.contains_key(label) {
            return Err(RepositoryError::not_found(LABEL, label));
        }
        push_unique(labels_of(&mut tables, target)?, *label);
        Ok(())
    }

    async fn detach_from(&self, _ctx: &RequestContext, label: &Id, target: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(LABEL, WriteOp::DetachFrom)?;

        labels_of(&mut tables, target)?.retain(|l| l != label);
        Ok(())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(LABEL, WriteOp::Delete)?;

        if let Some(document) = tables.documents.values().find(|d| d.labels.contains(id)) {
            return Err(RepositoryError::WriteFailed {
                entity_type: LABEL,
                operation: WriteOp::Delete,
                reason: format!("label is still attached to {}", document.id),
            });
        }
        remove(&mut tables.labels, LABEL, id).map(|_| ())
    }
}
