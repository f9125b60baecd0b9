//! Declarative invalidation topology.
//!
//! Each entity family has one [`EntityRule`] row describing what it caches
//! (collections and lookups) and which other families it must wipe when it
//! is written ([`CrossEdge`]). Cached repositories never call each other;
//! they turn an [`InvalidationRequest`] into an [`InvalidationPlan`] and
//! execute it against the shared store.
//!
//! Plans are ordered: own collection patterns, lookup patterns, cross-entity
//! patterns, then single keys.

use std::fmt;

use crate::id::{Id, ResourceType};

use super::keys::{collection_pattern, resource_pattern, scoped_collection_pattern, KeyOp};

/// Write operations a cached repository can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
    AddMember,
    RemoveMember,
    AttachTo,
    DetachFrom,
}

impl WriteOp {
    pub const ALL: [WriteOp; 7] = [
        WriteOp::Create,
        WriteOp::Update,
        WriteOp::Delete,
        WriteOp::AddMember,
        WriteOp::RemoveMember,
        WriteOp::AttachTo,
        WriteOp::DetachFrom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOp::Create => "Create",
            WriteOp::Update => "Update",
            WriteOp::Delete => "Delete",
            WriteOp::AddMember => "AddMember",
            WriteOp::RemoveMember => "RemoveMember",
            WriteOp::AttachTo => "AttachTo",
            WriteOp::DetachFrom => "DetachFrom",
        }
    }

    /// Returns true if the operation changes an entity that may already be
    /// cached under its canonical key or a lookup key.
    pub fn touches_existing(&self) -> bool {
        !matches!(self, WriteOp::Create)
    }
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared dependency: writes of the owning entity listed in `on` wipe
/// every key of `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossEdge {
    pub target: ResourceType,
    pub on: &'static [WriteOp],
}

impl CrossEdge {
    pub fn applies_to(&self, op: WriteOp) -> bool {
        self.on.contains(&op)
    }
}

/// One row of the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRule {
    pub resource: ResourceType,
    /// Paginated collections cached for this entity, in invalidation order.
    pub collections: &'static [KeyOp],
    /// Single-entity lookups by a secondary field (email, project key).
    pub lookups: &'static [KeyOp],
    /// Cross-entity edges, in invalidation order.
    pub edges: &'static [CrossEdge],
    /// False for proxy-only repositories: reads bypass the cache, writes
    /// still cascade along `edges`.
    pub caches_reads: bool,
}

const ALL_WRITES: &[WriteOp] = &WriteOp::ALL;
const CREATE_ONLY: &[WriteOp] = &[WriteOp::Create];
const ATTACH_DETACH: &[WriteOp] = &[WriteOp::AttachTo, WriteOp::DetachFrom];

const fn edge(target: ResourceType, on: &'static [WriteOp]) -> CrossEdge {
    CrossEdge { target, on }
}

pub const USER_RULE: EntityRule = EntityRule {
    resource: ResourceType::User,
    collections: &[KeyOp::GetAll],
    lookups: &[KeyOp::GetByEmail],
    edges: &[
        edge(ResourceType::Organization, ALL_WRITES),
        edge(ResourceType::Role, ALL_WRITES),
    ],
    caches_reads: true,
};

pub const ORGANIZATION_RULE: EntityRule = EntityRule {
    resource: ResourceType::Organization,
    collections: &[KeyOp::GetAll],
    lookups: &[],
    edges: &[],
    caches_reads: true,
};

pub const NAMESPACE_RULE: EntityRule = EntityRule {
    resource: ResourceType::Namespace,
    collections: &[KeyOp::GetAll],
    lookups: &[],
    edges: &[edge(ResourceType::Organization, ALL_WRITES)],
    caches_reads: true,
};

pub const PROJECT_RULE: EntityRule = EntityRule {
    resource: ResourceType::Project,
    collections: &[KeyOp::GetAll],
    lookups: &[KeyOp::GetByKey],
    edges: &[edge(ResourceType::Namespace, ALL_WRITES)],
    caches_reads: true,
};

pub const DOCUMENT_RULE: EntityRule = EntityRule {
    resource: ResourceType::Document,
    collections: &[KeyOp::GetAllBelongsTo, KeyOp::GetByCreator],
    lookups: &[],
    edges: &[
        edge(ResourceType::Namespace, ALL_WRITES),
        edge(ResourceType::Project, ALL_WRITES),
        edge(ResourceType::User, ALL_WRITES),
    ],
    caches_reads: true,
};

pub const ISSUE_RULE: EntityRule = EntityRule {
    resource: ResourceType::Issue,
    collections: &[KeyOp::GetAllBelongsTo],
    lookups: &[],
    edges: &[
        edge(ResourceType::Attachment, CREATE_ONLY),
        edge(ResourceType::Comment, ALL_WRITES),
    ],
    caches_reads: true,
};

pub const COMMENT_RULE: EntityRule = EntityRule {
    resource: ResourceType::Comment,
    collections: &[KeyOp::GetAllBelongsTo],
    lookups: &[],
    edges: &[
        edge(ResourceType::Issue, ALL_WRITES),
        edge(ResourceType::Document, ALL_WRITES),
    ],
    caches_reads: true,
};

pub const ATTACHMENT_RULE: EntityRule = EntityRule {
    resource: ResourceType::Attachment,
    collections: &[KeyOp::GetAllBelongsTo],
    lookups: &[],
    edges: &[
        edge(ResourceType::Issue, ALL_WRITES),
        edge(ResourceType::Document, ALL_WRITES),
    ],
    caches_reads: true,
};

pub const ASSIGNMENT_RULE: EntityRule = EntityRule {
    resource: ResourceType::Assignment,
    collections: &[KeyOp::GetBySubject, KeyOp::GetByTarget],
    lookups: &[],
    edges: &[],
    caches_reads: true,
};

pub const LABEL_RULE: EntityRule = EntityRule {
    resource: ResourceType::Label,
    collections: &[KeyOp::GetAll],
    lookups: &[],
    edges: &[edge(ResourceType::Document, ATTACH_DETACH)],
    caches_reads: true,
};

pub const ROLE_RULE: EntityRule = EntityRule {
    resource: ResourceType::Role,
    collections: &[KeyOp::GetAllBelongsTo],
    lookups: &[],
    edges: &[
        edge(ResourceType::Organization, ALL_WRITES),
        edge(ResourceType::Project, ALL_WRITES),
    ],
    caches_reads: true,
};

// Stale permissions are a safety hazard, so reads are never cached.
pub const PERMISSION_RULE: EntityRule = EntityRule {
    resource: ResourceType::Permission,
    collections: &[
        KeyOp::GetBySubject,
        KeyOp::GetByTarget,
        KeyOp::GetBySubjectAndTarget,
    ],
    lookups: &[],
    edges: &[
        edge(ResourceType::Role, ALL_WRITES),
        edge(ResourceType::User, ALL_WRITES),
    ],
    caches_reads: false,
};

pub const TODO_RULE: EntityRule = EntityRule {
    resource: ResourceType::Todo,
    collections: &[KeyOp::GetByOwner],
    lookups: &[],
    edges: &[],
    caches_reads: true,
};

pub const NOTIFICATION_RULE: EntityRule = EntityRule {
    resource: ResourceType::Notification,
    collections: &[KeyOp::GetByRecipient],
    lookups: &[],
    edges: &[],
    caches_reads: true,
};

/// The full table, one row per resource type.
pub static TOPOLOGY: [&EntityRule; 14] = [
    &USER_RULE,
    &ORGANIZATION_RULE,
    &NAMESPACE_RULE,
    &PROJECT_RULE,
    &DOCUMENT_RULE,
    &ISSUE_RULE,
    &COMMENT_RULE,
    &ATTACHMENT_RULE,
    &ASSIGNMENT_RULE,
    &LABEL_RULE,
    &ROLE_RULE,
    &PERMISSION_RULE,
    &TODO_RULE,
    &NOTIFICATION_RULE,
];

/// Returns the topology row for a resource type.
pub fn rule_for(resource: ResourceType) -> &'static EntityRule {
    match resource {
        ResourceType::User => &USER_RULE,
        ResourceType::Organization => &ORGANIZATION_RULE,
        ResourceType::Namespace => &NAMESPACE_RULE,
        ResourceType::Project => &PROJECT_RULE,
        ResourceType::Document => &DOCUMENT_RULE,
        ResourceType::Issue => &ISSUE_RULE,
        ResourceType::Comment => &COMMENT_RULE,
        ResourceType::Attachment => &ATTACHMENT_RULE,
        ResourceType::Assignment => &ASSIGNMENT_RULE,
        ResourceType::Label => &LABEL_RULE,
        ResourceType::Role => &ROLE_RULE,
        ResourceType::Permission => &PERMISSION_RULE,
        ResourceType::Todo => &TODO_RULE,
        ResourceType::Notification => &NOTIFICATION_RULE,
    }
}

/// What a single write knows about the keys it affects.
///
/// Scopes narrow collection patterns to one parent (e.g. the issue a comment
/// belongs to). Collections without a known scope are wiped across all
/// scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationRequest {
    resource: ResourceType,
    op: WriteOp,
    scopes: Vec<(KeyOp, Id)>,
    keys: Vec<String>,
}

impl InvalidationRequest {
    pub fn new(resource: ResourceType, op: WriteOp) -> Self {
        Self {
            resource,
            op,
            scopes: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Declares the scope identifier of one of the entity's collections.
    pub fn scope(mut self, collection: KeyOp, scope: &Id) -> Self {
        self.scopes.push((collection, *scope));
        self
    }

    /// Adds a single key to delete (usually the canonical entity key).
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    pub fn op(&self) -> WriteOp {
        self.op
    }

    /// Expands the request against the topology.
    pub fn plan(&self) -> InvalidationPlan {
        let rule = rule_for(self.resource);
        let mut plan = InvalidationPlan::default();

        if rule.caches_reads {
            for collection in rule.collections {
                let mut scoped = self
                    .scopes
                    .iter()
                    .filter(|(op, _)| op == collection)
                    .peekable();

                if scoped.peek().is_none() {
                    plan.push_pattern(collection_pattern(self.resource, *collection));
                } else {
                    for (_, scope) in scoped {
                        plan.push_pattern(scoped_collection_pattern(
                            self.resource,
                            *collection,
                            scope,
                        ));
                    }
                }
            }

            if self.op.touches_existing() {
                for lookup in rule.lookups {
                    plan.push_pattern(collection_pattern(self.resource, *lookup));
                }
            }
        }

        for edge in rule.edges.iter().filter(|e| e.applies_to(self.op)) {
            plan.push_pattern(resource_pattern(edge.target));
        }

        if rule.caches_reads && self.op.touches_existing() {
            for key in &self.keys {
                plan.push_key(key.clone());
            }
        }

        plan
    }
}

/// One step of an invalidation plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation<'a> {
    Pattern(&'a str),
    Key(&'a str),
}

/// Ordered, de-duplicated list of patterns and keys to delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    patterns: Vec<String>,
    keys: Vec<String>,
}

impl InvalidationPlan {
    fn push_pattern(&mut self, pattern: String) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    fn push_key(&mut self, key: String) {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.keys.is_empty()
    }

    /// Steps in execution order: every pattern, then every single key.
    pub fn steps(&self) -> impl Iterator<Item = Invalidation<'_>> {
        self.patterns
            .iter()
            .map(|p| Invalidation::Pattern(p.as_str()))
            .chain(self.keys.iter().map(|k| Invalidation::Key(k.as_str())))
    }

    /// The same plan without its single keys.
    pub fn patterns_only(&self) -> InvalidationPlan {
        InvalidationPlan {
            patterns: self.patterns.clone(),
            keys: Vec::new(),
        }
    }
}
