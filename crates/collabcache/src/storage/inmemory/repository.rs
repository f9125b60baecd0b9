//! In-memory repository implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use collabcache_core::cache::WriteOp;
use collabcache_core::domain::{
    Assignment, Attachment, Comment, Document, Issue, Label, Namespace, Notification,
    Organization, Permission, Project, Role, Todo, User,
};
use collabcache_core::storage::{Page, Patch, RepositoryError, Result};
use collabcache_core::Id;

/// Every table of the collaboration graph.
#[derive(Debug, Default)]
pub(super) struct Tables {
    pub users: BTreeMap<Id, User>,
    pub organizations: BTreeMap<Id, Organization>,
    pub namespaces: BTreeMap<Id, Namespace>,
    pub projects: BTreeMap<Id, Project>,
    pub documents: BTreeMap<Id, Document>,
    pub issues: BTreeMap<Id, Issue>,
    pub comments: BTreeMap<Id, Comment>,
    pub attachments: BTreeMap<Id, Attachment>,
    pub assignments: BTreeMap<Id, Assignment>,
    pub labels: BTreeMap<Id, Label>,
    pub roles: BTreeMap<Id, Role>,
    pub permissions: BTreeMap<Id, Permission>,
    pub todos: BTreeMap<Id, Todo>,
    pub notifications: BTreeMap<Id, Notification>,
    /// Child → parent edges (namespace → organization, comment → issue, ...).
    pub parents: HashMap<Id, Id>,
    /// When set, every write fails with this reason.
    pub write_failure: Option<String>,
}

impl Tables {
    pub fn parent_is(&self, child: &Id, parent: &Id) -> bool {
        self.parents.get(child) == Some(parent)
    }

    pub fn check_writable(&self, entity_type: &'static str, operation: WriteOp) -> Result<()> {
        match &self.write_failure {
            Some(reason) => Err(RepositoryError::WriteFailed {
                entity_type,
                operation,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct CallStats {
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// In-memory authoritative repository for testing and local development.
///
/// Implements all fourteen repository traits over one set of tables behind
/// an `Arc<RwLock<_>>`. Data is not persisted and will be lost when the
/// last clone is dropped. Every call is counted so tests can assert how
/// often the authoritative side was reached.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    pub(super) tables: Arc<RwLock<Tables>>,
    stats: Arc<CallStats>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read calls served so far.
    pub fn reads(&self) -> usize {
        self.stats.reads.load(Ordering::SeqCst)
    }

    /// Number of write calls received so far, including failed ones.
    pub fn writes(&self) -> usize {
        self.stats.writes.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.stats.reads.store(0, Ordering::SeqCst);
        self.stats.writes.store(0, Ordering::SeqCst);
    }

    /// Makes every following write fail with `reason`, or clears the
    /// failure with `None`.
    pub async fn set_write_failure(&self, reason: Option<&str>) {
        self.tables.write().await.write_failure = reason.map(str::to_string);
    }

    pub(super) fn count_read(&self) {
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) fn count_write(&self) {
        self.stats.writes.fetch_add(1, Ordering::SeqCst);
    }
}

pub(super) fn find<T: Clone>(
    table: &BTreeMap<Id, T>,
    entity_type: &'static str,
    id: &Id,
) -> Result<T> {
    table
        .get(id)
        .cloned()
        .ok_or_else(|| RepositoryError::not_found(entity_type, id))
}

pub(super) fn find_mut<'a, T>(
    table: &'a mut BTreeMap<Id, T>,
    entity_type: &'static str,
    id: &Id,
) -> Result<&'a mut T> {
    table
        .get_mut(id)
        .ok_or_else(|| RepositoryError::not_found(entity_type, id))
}

pub(super) fn insert_new<T>(
    table: &mut BTreeMap<Id, T>,
    entity_type: &'static str,
    id: Id,
    value: T,
) -> Result<()> {
    if table.contains_key(&id) {
        return Err(RepositoryError::AlreadyExists {
            entity_type,
            id: id.to_string(),
        });
    }
    table.insert(id, value);
    Ok(())
}

pub(super) fn remove<T>(
    table: &mut BTreeMap<Id, T>,
    entity_type: &'static str,
    id: &Id,
) -> Result<T> {
    table
        .remove(id)
        .ok_or_else(|| RepositoryError::not_found(entity_type, id))
}

/// Applies `page` to the values matching `filter`, in identifier order.
pub(super) fn page_of<'a, T, F>(table: &'a BTreeMap<Id, T>, page: Page, filter: F) -> Vec<T>
where
    T: Clone + 'a,
    F: Fn(&T) -> bool,
{
    table
        .values()
        .filter(|value| filter(value))
        .skip(page.offset)
        .take(page.limit)
        .cloned()
        .collect()
}

pub(super) fn push_unique(list: &mut Vec<Id>, id: Id) {
    if !list.contains(&id) {
        list.push(id);
    }
}

/// Applies a field patch to an entity through its JSON form and stamps
/// `updated_at`.
///
/// The identifier cannot be patched and unknown fields are rejected.
pub(super) fn apply_patch<T>(entity: &T, patch: &Patch) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut fields = match serde_json::to_value(entity) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err(RepositoryError::InvalidData("entity is not a record".to_string())),
        Err(e) => return Err(RepositoryError::InvalidData(e.to_string())),
    };

    for (field, value) in patch {
        if field == "id" {
            return Err(RepositoryError::InvalidData("`id` cannot be patched".to_string()));
        }
        if !fields.contains_key(field) {
            return Err(RepositoryError::InvalidData(format!("unknown field `{field}`")));
        }
        fields.insert(field.clone(), value.clone());
    }

    if fields.contains_key("updated_at") {
        let now = serde_json::to_value(Utc::now())
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;
        fields.insert("updated_at".to_string(), now);
    }

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| RepositoryError::InvalidData(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabcache_core::ResourceType;
    use serde_json::json;

    fn patch(value: Value) -> Patch {
        match value {
            Value::Object(map) => map,
            _ => panic!("patch must be an object"),
        }
    }

    #[test]
    fn test_apply_patch_updates_fields() {
        let user = User::new("alice", "a@x");
        let updated = apply_patch(&user, &patch(json!({ "email": "b@x" }))).unwrap();

        assert_eq!(updated.email, "b@x");
        assert_eq!(updated.username, "alice");
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn test_apply_patch_rejects_id() {
        let user = User::new("alice", "a@x");
        let result = apply_patch(&user, &patch(json!({ "id": "user_x" })));
        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[test]
    fn test_apply_patch_rejects_unknown_fields() {
        let label = Label::new("bug");
        let result = apply_patch(&label, &patch(json!({ "colour": "red" })));
        assert!(matches!(result, Err(RepositoryError::InvalidData(msg)) if msg.contains("colour")));
    }

    #[test]
    fn test_apply_patch_rejects_wrong_types() {
        let owner = Id::new(ResourceType::User);
        let todo = Todo::new("write docs", owner, owner);
        let result = apply_patch(&todo, &patch(json!({ "completed": "yes" })));
        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[test]
    fn test_page_of_keeps_identifier_order() {
        let mut table = BTreeMap::new();
        for n in 0..5 {
            let label = Label::new(format!("l{n}"));
            table.insert(label.id, label);
        }
        let all = page_of(&table, Page::new(0, 10), |_| true);
        let second_page = page_of(&table, Page::new(2, 2), |_| true);

        assert_eq!(all.len(), 5);
        assert_eq!(second_page, all[2..4].to_vec());
    }
}
