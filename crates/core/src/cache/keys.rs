//! Pure functions composing cache keys and invalidation patterns.
//!
//! Every key is a `:`-joined list of fragments. The first fragment is always
//! the resource type tag, so `<tag>:*` covers everything an entity family
//! ever stored.

use std::fmt;

use crate::id::{Id, ResourceType};
use crate::storage::Page;

/// Separator placed between key fragments.
pub const KEY_SEPARATOR: &str = ":";

/// Operation names used as the second segment of lookup and collection keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyOp {
    GetAll,
    GetAllBelongsTo,
    GetByCreator,
    GetByEmail,
    GetByKey,
    GetByRecipient,
    GetByOwner,
    GetBySubject,
    GetByTarget,
    GetBySubjectAndTarget,
}

impl KeyOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyOp::GetAll => "GetAll",
            KeyOp::GetAllBelongsTo => "GetAllBelongsTo",
            KeyOp::GetByCreator => "GetByCreator",
            KeyOp::GetByEmail => "GetByEmail",
            KeyOp::GetByKey => "GetByKey",
            KeyOp::GetByRecipient => "GetByRecipient",
            KeyOp::GetByOwner => "GetByOwner",
            KeyOp::GetBySubject => "GetBySubject",
            KeyOp::GetByTarget => "GetByTarget",
            KeyOp::GetBySubjectAndTarget => "GetBySubjectAndTarget",
        }
    }
}

impl fmt::Display for KeyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single input to [`compose_key`].
///
/// Fragments are not escaped. Callers must not pass text containing `:`;
/// identifiers and operation names never do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFragment {
    Nil,
    Text(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
    List(Vec<String>),
}

impl KeyFragment {
    fn render(&self, out: &mut String) {
        match self {
            KeyFragment::Nil => {}
            KeyFragment::Text(text) => out.push_str(text),
            KeyFragment::Int(n) => out.push_str(&n.to_string()),
            KeyFragment::UInt(n) => out.push_str(&n.to_string()),
            KeyFragment::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            KeyFragment::List(items) => out.push_str(&items.join(KEY_SEPARATOR)),
        }
    }
}

impl From<&str> for KeyFragment {
    fn from(value: &str) -> Self {
        KeyFragment::Text(value.to_string())
    }
}

impl From<String> for KeyFragment {
    fn from(value: String) -> Self {
        KeyFragment::Text(value)
    }
}

impl From<&String> for KeyFragment {
    fn from(value: &String) -> Self {
        KeyFragment::Text(value.clone())
    }
}

impl From<&Id> for KeyFragment {
    fn from(value: &Id) -> Self {
        KeyFragment::Text(value.to_string())
    }
}

impl From<Id> for KeyFragment {
    fn from(value: Id) -> Self {
        KeyFragment::Text(value.to_string())
    }
}

impl From<ResourceType> for KeyFragment {
    fn from(value: ResourceType) -> Self {
        KeyFragment::Text(value.as_str().to_string())
    }
}

impl From<KeyOp> for KeyFragment {
    fn from(value: KeyOp) -> Self {
        KeyFragment::Text(value.as_str().to_string())
    }
}

impl From<bool> for KeyFragment {
    fn from(value: bool) -> Self {
        KeyFragment::Bool(value)
    }
}

impl From<i32> for KeyFragment {
    fn from(value: i32) -> Self {
        KeyFragment::Int(value.into())
    }
}

impl From<i64> for KeyFragment {
    fn from(value: i64) -> Self {
        KeyFragment::Int(value)
    }
}

impl From<u32> for KeyFragment {
    fn from(value: u32) -> Self {
        KeyFragment::UInt(value.into())
    }
}

impl From<u64> for KeyFragment {
    fn from(value: u64) -> Self {
        KeyFragment::UInt(value)
    }
}

impl From<usize> for KeyFragment {
    fn from(value: usize) -> Self {
        KeyFragment::UInt(value as u64)
    }
}

impl From<Vec<String>> for KeyFragment {
    fn from(value: Vec<String>) -> Self {
        KeyFragment::List(value)
    }
}

impl From<&[String]> for KeyFragment {
    fn from(value: &[String]) -> Self {
        KeyFragment::List(value.to_vec())
    }
}

impl<T: Into<KeyFragment>> From<Option<T>> for KeyFragment {
    fn from(value: Option<T>) -> Self {
        value.map_or(KeyFragment::Nil, Into::into)
    }
}

/// Joins the rendered fragments with [`KEY_SEPARATOR`].
///
/// `Nil` renders as an empty segment and lists render as their elements
/// joined by the separator.
///
/// # Examples
///
/// ```
/// use collabcache_core::cache::{compose_key, KeyFragment};
///
/// let key = compose_key([
///     KeyFragment::from("todo"),
///     KeyFragment::from(0u32),
///     KeyFragment::from(true),
///     KeyFragment::Nil,
/// ]);
/// assert_eq!(key, "todo:0:true:");
/// ```
pub fn compose_key<I>(fragments: I) -> String
where
    I: IntoIterator<Item = KeyFragment>,
{
    let mut key = String::new();
    for (i, fragment) in fragments.into_iter().enumerate() {
        if i > 0 {
            key.push_str(KEY_SEPARATOR);
        }
        fragment.render(&mut key);
    }
    key
}

/// Composes a cache key from heterogeneous fragments.
///
/// ```
/// use collabcache_core::cache_key;
///
/// assert_eq!(cache_key!("user", "GetAll", 0u32, 10u32), "user:GetAll:0:10");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($($fragment:expr),+ $(,)?) => {
        $crate::cache::compose_key([$($crate::cache::KeyFragment::from($fragment)),+])
    };
}

/// Returns the canonical single-entity key `<tag>:<id>`.
pub fn entity_key(id: &Id) -> String {
    cache_key!(id.kind(), id)
}

/// Returns a single-entity key narrowed by an extra discriminator, e.g. the
/// recipient a notification is read for.
pub fn discriminated_entity_key(id: &Id, discriminator: &Id) -> String {
    cache_key!(id.kind(), id, discriminator)
}

/// Returns the key for a single-entity lookup by a secondary field.
pub fn lookup_key(kind: ResourceType, op: KeyOp, value: &str) -> String {
    cache_key!(kind, op, value)
}

/// Returns the key for a page of a collection.
///
/// The scope segment is omitted when the collection is unscoped. Extra
/// discriminators (filters) are appended after offset and limit.
pub fn collection_key(
    kind: ResourceType,
    op: KeyOp,
    scope: Option<&Id>,
    page: Page,
    extra: &[KeyFragment],
) -> String {
    let mut fragments = vec![KeyFragment::from(kind), KeyFragment::from(op)];
    if let Some(scope) = scope {
        fragments.push(KeyFragment::from(scope));
    }
    fragments.push(KeyFragment::from(page.offset));
    fragments.push(KeyFragment::from(page.limit));
    fragments.extend(extra.iter().cloned());
    compose_key(fragments)
}

/// Returns the pattern matching every page of a collection, across scopes.
pub fn collection_pattern(kind: ResourceType, op: KeyOp) -> String {
    cache_key!(kind, op, "*")
}

/// Returns the pattern matching every page of a collection within one scope.
pub fn scoped_collection_pattern(kind: ResourceType, op: KeyOp, scope: &Id) -> String {
    cache_key!(kind, op, scope, "*")
}

/// Returns the pattern matching everything an entity family has cached.
pub fn resource_pattern(kind: ResourceType) -> String {
    cache_key!(kind, "*")
}
