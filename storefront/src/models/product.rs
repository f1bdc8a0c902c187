//! Product resource

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{checked_number, Numeric, Resource, UniqueField, WriteContext};
use crate::ids::ResourceId;
use crate::query::{FilterField, FilterValue};
use crate::repository::RepositoryResult;
use crate::validation::{self, ValidationErrors};

/// Stored product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ResourceId,
    pub name: String,
    pub avatar_url: String,
    pub rating: i64,
    pub quantity: i64,
    pub price: f64,
    #[serde(default)]
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product create payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub name: String,
    pub avatar_url: String,
    pub rating: Numeric,
    pub quantity: Numeric,
    pub price: Numeric,
    #[serde(default)]
    pub disabled: Option<bool>,
}

/// Product partial update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub rating: Option<Numeric>,
    pub quantity: Option<Numeric>,
    pub price: Option<Numeric>,
    pub disabled: Option<bool>,
}

/// Public product representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ResourceId,
    pub name: String,
    pub avatar_url: String,
    pub price: f64,
    pub rating: i64,
    pub quantity: i64,
    pub disabled: bool,
}

/// Project a product into its public fields
pub fn transform(product: &Product) -> ProductView {
    ProductView {
        id: product.id,
        name: product.name.clone(),
        avatar_url: product.avatar_url.clone(),
        price: product.price,
        rating: product.rating,
        quantity: product.quantity,
        disabled: product.disabled,
    }
}

impl Resource for Product {
    type Create = CreateProduct;
    type Update = UpdateProduct;
    type View = ProductView;

    const COLLECTION: &'static str = "products";
    const ENTITY: &'static str = "Product";
    const FILTERABLE: &'static [FilterField] = &[
        FilterField::text("name"),
        FilterField::integer("rating"),
        FilterField::decimal("price"),
        FilterField::flag("disabled"),
    ];
    const UNIQUE: Option<UniqueField> = Some(UniqueField {
        field: "name",
        message: "Name already taken",
    });

    fn id(&self) -> ResourceId {
        self.id
    }

    fn build(id: ResourceId, data: CreateProduct, ctx: &WriteContext<'_>) -> RepositoryResult<Self> {
        let avatar_url = data.avatar_url.trim().to_string();

        let mut errors = ValidationErrors::new();
        errors.record(validation::name(&data.name));
        errors.record(validation::avatar_url(&avatar_url));
        let rating = checked_number(&mut errors, "rating", &data.rating, validation::rating);
        let quantity = checked_number(&mut errors, "quantity", &data.quantity, validation::quantity);
        let price = checked_number(&mut errors, "price", &data.price, validation::price);
        errors.into_result()?;

        Ok(Self {
            id,
            name: data.name,
            avatar_url,
            rating: rating as i64,
            quantity: quantity as i64,
            price,
            disabled: data.disabled.unwrap_or(false),
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    fn merge(&mut self, data: UpdateProduct, ctx: &WriteContext<'_>) -> RepositoryResult<()> {
        let mut errors = ValidationErrors::new();

        if let Some(name) = data.name {
            errors.record(validation::name(&name));
            self.name = name;
        }
        if let Some(avatar_url) = data.avatar_url {
            let avatar_url = avatar_url.trim().to_string();
            errors.record(validation::avatar_url(&avatar_url));
            self.avatar_url = avatar_url;
        }
        if let Some(rating) = data.rating {
            self.rating = checked_number(&mut errors, "rating", &rating, validation::rating) as i64;
        }
        if let Some(quantity) = data.quantity {
            self.quantity =
                checked_number(&mut errors, "quantity", &quantity, validation::quantity) as i64;
        }
        if let Some(price) = data.price {
            self.price = checked_number(&mut errors, "price", &price, validation::price);
        }
        if let Some(disabled) = data.disabled {
            self.disabled = disabled;
        }

        errors.into_result()?;
        self.updated_at = ctx.now;
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.record(validation::name(&self.name));
        errors.record(validation::avatar_url(&self.avatar_url));
        errors.record(validation::rating(self.rating as f64));
        errors.record(validation::quantity(self.quantity as f64));
        errors.record(validation::price(self.price));
        errors.into_result()
    }

    fn unique_value(&self) -> Option<FilterValue> {
        Some(FilterValue::String(self.name.clone()))
    }

    fn unique_in_update(data: &UpdateProduct) -> Option<FilterValue> {
        data.name.clone().map(FilterValue::String)
    }

    fn view(&self) -> ProductView {
        transform(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PasswordHasher;
    use crate::repository::RepositoryErrorKind;
    use serde_json::json;

    fn create(value: serde_json::Value) -> RepositoryResult<Product> {
        let hasher = PasswordHasher::default();
        let ctx = WriteContext {
            now: Utc::now(),
            hasher: &hasher,
        };
        let data: CreateProduct = serde_json::from_value(value).unwrap();
        Product::build(ResourceId::new(), data, &ctx)
    }

    fn valid() -> serde_json::Value {
        json!({
            "name": "Gorgeous Chair",
            "avatarUrl": "http://lorempixel.com/640/480/food",
            "rating": 4,
            "quantity": 10,
            "price": "23.32"
        })
    }

    #[test]
    fn test_build_valid_product() {
        let product = create(valid()).unwrap();
        assert_eq!(product.rating, 4);
        assert_eq!(product.quantity, 10);
        assert_eq!(product.price, 23.32);
        assert!(!product.disabled);
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_build_collects_every_violation() {
        let err = create(json!({
            "name": "chair",
            "avatarUrl": "nope",
            "rating": 6,
            "quantity": 0,
            "price": "free"
        }))
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ValidationFailed);
        let violations = err.violations.unwrap();
        for field in ["name", "avatarUrl", "rating", "quantity", "price"] {
            assert!(violations.has_field(field), "missing violation for {}", field);
        }
    }

    #[test]
    fn test_avatar_url_is_trimmed() {
        let mut value = valid();
        value["avatarUrl"] = json!("  http://lorempixel.com/640/480/food  ");
        let product = create(value).unwrap();
        assert_eq!(product.avatar_url, "http://lorempixel.com/640/480/food");
    }

    #[test]
    fn test_fractional_rating_rejected() {
        let mut value = valid();
        value["rating"] = json!(2.5);
        assert!(create(value).is_err());
    }

    #[test]
    fn test_merge() {
        let hasher = PasswordHasher::default();
        let ctx = WriteContext {
            now: Utc::now(),
            hasher: &hasher,
        };
        let mut product = create(valid()).unwrap();
        let update: UpdateProduct =
            serde_json::from_value(json!({"rating": "5", "disabled": true})).unwrap();
        product.merge(update, &ctx).unwrap();
        assert_eq!(product.rating, 5);
        assert!(product.disabled);
        assert_eq!(product.name, "Gorgeous Chair");

        let update: UpdateProduct =
            serde_json::from_value(json!({"avatarUrl": " https://example.com/b.png\n"})).unwrap();
        product.merge(update, &ctx).unwrap();
        assert_eq!(product.avatar_url, "https://example.com/b.png");

        let update: UpdateProduct = serde_json::from_value(json!({"quantity": 1001})).unwrap();
        let err = product.merge(update, &ctx).unwrap_err();
        assert!(err.violations.unwrap().has_field("quantity"));
    }

    #[test]
    fn test_transform_exposes_public_fields_only() {
        let product = create(valid()).unwrap();
        let view = serde_json::to_value(transform(&product)).unwrap();
        let keys: Vec<&str> = view.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 7);
        for key in ["id", "name", "avatarUrl", "price", "rating", "quantity", "disabled"] {
            assert!(view.get(key).is_some(), "missing {}", key);
        }
        assert!(view.get("createdAt").is_none());
        assert_eq!(view["rating"], json!(4));
    }

    #[test]
    fn test_unique_values() {
        let product = create(valid()).unwrap();
        assert_eq!(
            product.unique_value(),
            Some(FilterValue::String("Gorgeous Chair".into()))
        );
        assert_eq!(Product::unique_in_update(&UpdateProduct::default()), None);
    }
}
