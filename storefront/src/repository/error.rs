//! Repository error types
//!
//! `NotFound` and `AlreadyExists` are the only domain outcomes. Everything
//! else describes bad input (`ValidationFailed`, `InvalidId`) or an
//! infrastructure failure (`StoreFailed`, `SerializationError`).
//!
//! # Example
//!
//! ```rust
//! use storefront::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("Product", "0190...");
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert!(error.entity_id.is_some());
//! ```

use std::fmt;

use crate::store::StoreError;
use crate::validation::ValidationErrors;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Finding a single entity by ID
    FindById,
    /// Listing entities with filters, sort and pagination
    FindAll,
    /// Counting entities matching filters
    Count,
    /// Creating a new entity
    Create,
    /// Updating an existing entity
    Update,
    /// Removing an entity
    Delete,
    /// Batch loading related entities
    BatchLoad,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindById => write!(f, "find_by_id"),
            Self::FindAll => write!(f, "find_all"),
            Self::Count => write!(f, "count"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::BatchLoad => write!(f, "batch_load"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Entity was not found
    NotFound,
    /// Another entity already holds a unique value
    AlreadyExists,
    /// Field rules rejected the candidate
    ValidationFailed,
    /// Identifier is not well-formed
    InvalidId,
    /// The document store failed
    StoreFailed,
    /// Serialization or deserialization error
    SerializationError,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::InvalidId => write!(f, "invalid_id"),
            Self::StoreFailed => write!(f, "store_failed"),
            Self::SerializationError => write!(f, "serialization_error"),
        }
    }
}

/// Structured repository error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The type of entity involved (e.g., "Product", "Order")
    pub entity_type: Option<String>,
    /// The ID of the entity involved
    pub entity_id: Option<String>,
    /// Field violations, for `ValidationFailed`
    pub violations: Option<ValidationErrors>,
    retriable: bool,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
            violations: None,
            retriable: false,
        }
    }

    /// Create a "not found" error with entity context
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::FindById,
            RepositoryErrorKind::NotFound,
            "Entity not found",
        )
        .with_entity(entity_type, entity_id)
    }

    /// Create an "already exists" error; `message` is reported to the client
    pub fn already_exists(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new(
            RepositoryOperation::Create,
            RepositoryErrorKind::AlreadyExists,
            message,
        );
        error.entity_type = Some(entity_type.into());
        error
    }

    /// Create a malformed-identifier error
    pub fn invalid_id(entity_type: impl Into<String>, raw: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        Self::new(
            RepositoryOperation::FindById,
            RepositoryErrorKind::InvalidId,
            format!("Invalid {} id", entity_type.to_lowercase()),
        )
        .with_entity(entity_type, raw)
    }

    /// Create a validation error carrying every field violation
    pub fn validation(violations: ValidationErrors) -> Self {
        let mut error = Self::new(
            RepositoryOperation::Create,
            RepositoryErrorKind::ValidationFailed,
            violations.to_string(),
        );
        error.violations = Some(violations);
        error
    }

    /// Wrap a document store failure
    pub fn store(operation: RepositoryOperation, err: StoreError) -> Self {
        let kind = match err {
            StoreError::Corrupt { .. } => RepositoryErrorKind::SerializationError,
            _ => RepositoryErrorKind::StoreFailed,
        };
        let mut error = Self::new(operation, kind, err.to_string());
        error.retriable = err.is_retriable();
        error
    }

    /// Create a serialization error
    pub fn serialization_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::SerializationError, message)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is retriable (transient store failures)
    pub fn is_retriable(&self) -> bool {
        self.kind == RepositoryErrorKind::StoreFailed && self.retriable
    }

    /// Whether this is a domain outcome rather than a failure
    pub fn is_domain(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::NotFound | RepositoryErrorKind::AlreadyExists
        )
    }
}

impl From<ValidationErrors> for RepositoryError {
    fn from(violations: ValidationErrors) -> Self {
        Self::validation(violations)
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}
