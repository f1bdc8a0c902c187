//! List-retrieval pipeline: filtering, sorting and pagination
//!
//! Every collection endpoint turns its raw query parameters into
//! [`QueryOptions`] via [`QueryOptions::from_params`] and hands the result to
//! the repository's list operation.

mod filter;
mod options;

pub use filter::{FieldKind, FilterCondition, FilterField, FilterValue, OrderDirection, SortSpec};
pub use options::{Pagination, QueryOptions, LIMIT_PARAM, PAGE_PARAM, SORT_PARAM};
