//! Resource entities, their write payloads and public views
//!
//! Each resource implements [`Resource`], which is everything the generic
//! document repository and handlers need: where it is stored, which fields a
//! list request may filter on, how a payload becomes an entity, and how an
//! entity is projected for output.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::PasswordHasher;
use crate::ids::ResourceId;
use crate::query::{FilterField, FilterValue};
use crate::repository::RepositoryResult;
use crate::validation::{FieldViolation, ValidationErrors};

pub mod order;
pub mod product;
pub mod user;

pub use order::{CartItem, CreateOrder, Order, OrderView, ShoppingCart, UpdateOrder};
pub use product::{CreateProduct, Product, ProductView, UpdateProduct};
pub use user::{CreateUser, Role, UpdateUser, User, UserView};

/// A field no two entities of a resource may share
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueField {
    /// Stored field name
    pub field: &'static str,
    /// Client-facing conflict message
    pub message: &'static str,
}

/// Inputs every write shares
#[derive(Debug, Clone, Copy)]
pub struct WriteContext<'a> {
    pub now: DateTime<Utc>,
    pub hasher: &'a PasswordHasher,
}

/// A persisted resource type
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Create payload
    type Create: DeserializeOwned + Send + 'static;
    /// Partial update payload
    type Update: DeserializeOwned + Send + 'static;
    /// Public representation
    type View: Serialize + Send;

    /// Document store collection
    const COLLECTION: &'static str;
    /// Entity name used in messages
    const ENTITY: &'static str;
    /// Fields list requests may filter on
    const FILTERABLE: &'static [FilterField];
    /// Uniqueness constraint, if any
    const UNIQUE: Option<UniqueField> = None;

    fn id(&self) -> ResourceId;

    /// Build a new entity from a create payload, checking every field rule
    fn build(id: ResourceId, data: Self::Create, ctx: &WriteContext<'_>) -> RepositoryResult<Self>;

    /// Merge the fields present in `data`, checking their rules
    fn merge(&mut self, data: Self::Update, ctx: &WriteContext<'_>) -> RepositoryResult<()>;

    /// Check the stored field rules on a complete entity
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Value of the unique field
    fn unique_value(&self) -> Option<FilterValue> {
        None
    }

    /// Normalized unique value carried by an update, if any
    fn unique_in_update(_data: &Self::Update) -> Option<FilterValue> {
        None
    }

    /// Whether an update touches fields a caller may not change on their own record
    fn privileged_update(_data: &Self::Update) -> bool {
        false
    }

    /// Project into the public representation
    fn view(&self) -> Self::View;
}

/// A numeric request field: a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Finite numeric value, if there is one
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        }
        .filter(|n| n.is_finite())
    }
}

impl From<f64> for Numeric {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Read a numeric field and apply its rule
///
/// Records a violation and returns NaN when the value is not numeric.
pub(crate) fn checked_number(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &Numeric,
    rule: impl Fn(f64) -> Result<(), FieldViolation>,
) -> f64 {
    match value.value() {
        Some(n) => {
            errors.record(rule(n));
            n
        }
        None => {
            errors.push(FieldViolation::new(field, "must be a number"));
            f64::NAN
        }
    }
}
