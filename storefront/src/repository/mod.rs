//! Resource repositories over the document store
//!
//! [`DocumentRepository`] implements [`Repository`] for every
//! [`Resource`](crate::models::Resource): create validates and enforces
//! uniqueness, update merges partial fields into the stored entity, and
//! remove hands back the entity's last state. [`ProductLookup`] resolves the
//! products an order references in one store query.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront::repository::{DocumentRepository, Repository};
//! use storefront::models::Product;
//! use storefront::query::QueryOptions;
//!
//! let products = DocumentRepository::<Product>::new(store, hasher);
//! let page = products.list(&QueryOptions::default().with_limit(10)).await?;
//! ```

mod document;
mod error;
mod lookup;
mod traits;

pub use document::DocumentRepository;
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use lookup::ProductLookup;
pub use traits::{RelationLoader, Repository, RepositoryResult};
