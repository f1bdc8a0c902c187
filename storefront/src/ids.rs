//! Entity identifiers
//!
//! Every stored entity is keyed by a UUIDv7, so identifiers sort by creation
//! time. On the wire and in documents the identifier is its hyphenated string
//! form.
//!
//! ```rust
//! use storefront::ids::ResourceId;
//!
//! let id = ResourceId::new();
//! let parsed = ResourceId::parse(&id.to_string(), "Product").unwrap();
//! assert_eq!(id, parsed);
//!
//! assert!(ResourceId::parse("not-an-id", "Product").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::RepositoryError;

/// Identifier of a stored entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Generate a new time-sortable identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse a path or body identifier
    ///
    /// A malformed identifier is reported against `entity_type` so it maps to
    /// a 400 response.
    pub fn parse(raw: &str, entity_type: &str) -> Result<Self, RepositoryError> {
        raw.parse()
            .map_err(|_| RepositoryError::invalid_id(entity_type, raw))
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ResourceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for ResourceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
