//! Typed identifiers for every entity the cache layer knows about.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// The closed set of entity kinds stored in the collaboration graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    User,
    Organization,
    Namespace,
    Project,
    Document,
    Issue,
    Comment,
    Attachment,
    Assignment,
    Label,
    Role,
    Permission,
    Todo,
    Notification,
}

impl ResourceType {
    /// Every resource type, in declaration order.
    pub const ALL: [ResourceType; 14] = [
        ResourceType::User,
        ResourceType::Organization,
        ResourceType::Namespace,
        ResourceType::Project,
        ResourceType::Document,
        ResourceType::Issue,
        ResourceType::Comment,
        ResourceType::Attachment,
        ResourceType::Assignment,
        ResourceType::Label,
        ResourceType::Role,
        ResourceType::Permission,
        ResourceType::Todo,
        ResourceType::Notification,
    ];

    /// Returns the tag used as the first segment of cache keys and as the
    /// prefix of identifier strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::User => "user",
            ResourceType::Organization => "organization",
            ResourceType::Namespace => "namespace",
            ResourceType::Project => "project",
            ResourceType::Document => "document",
            ResourceType::Issue => "issue",
            ResourceType::Comment => "comment",
            ResourceType::Attachment => "attachment",
            ResourceType::Assignment => "assignment",
            ResourceType::Label => "label",
            ResourceType::Role => "role",
            ResourceType::Permission => "permission",
            ResourceType::Todo => "todo",
            ResourceType::Notification => "notification",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| IdError::UnknownResourceType(s.to_string()))
    }
}

/// Errors produced while parsing an identifier from its string form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Identifier is missing the type tag: {0}")]
    MissingTypeTag(String),
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),
    #[error("Invalid identifier body: {0}")]
    InvalidBody(String),
}

/// A globally unique identifier that carries its resource type.
///
/// The string form is `<tag>_<uuid>`, e.g.
/// `user_00000000-0000-0000-0000-000000000000`. It never contains the key
/// separator `:`, so it can be used as a cache key fragment as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id {
    kind: ResourceType,
    inner: Uuid,
}

impl Id {
    /// Allocates a fresh random identifier of the given type.
    pub fn new(kind: ResourceType) -> Self {
        Self {
            kind,
            inner: Uuid::new_v4(),
        }
    }

    /// Builds an identifier from an existing UUID.
    pub fn from_uuid(kind: ResourceType, inner: Uuid) -> Self {
        Self { kind, inner }
    }

    /// The nil identifier of a type (useful for testing).
    pub fn nil(kind: ResourceType) -> Self {
        Self::from_uuid(kind, Uuid::nil())
    }

    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    pub fn uuid(&self) -> Uuid {
        self.inner
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.inner)
    }
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, body) = s
            .split_once('_')
            .ok_or_else(|| IdError::MissingTypeTag(s.to_string()))?;
        let kind = tag.parse()?;
        let inner = Uuid::parse_str(body).map_err(|e| IdError::InvalidBody(e.to_string()))?;
        Ok(Self { kind, inner })
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
