use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of any remote entity (page, block, database, comment).
///
/// The crawler never interprets the value; it only trims surrounding
/// whitespace and refuses empty input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyResourceId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

/// The kinds of entity the crawler retrieves, each with its own cache partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Document,
    Block,
    Collection,
    Annotation,
    PropertyDetail,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Document,
        EntityKind::Block,
        EntityKind::Collection,
        EntityKind::Annotation,
        EntityKind::PropertyDetail,
    ];

    /// Stable position of this kind in [`EntityKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            EntityKind::Document => 0,
            EntityKind::Block => 1,
            EntityKind::Collection => 2,
            EntityKind::Annotation => 3,
            EntityKind::PropertyDetail => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Document => "document",
            EntityKind::Block => "block",
            EntityKind::Collection => "collection",
            EntityKind::Annotation => "annotation",
            EntityKind::PropertyDetail => "property_detail",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
