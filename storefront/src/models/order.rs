//! Order resource
//!
//! Cart items reference products weakly: the id must be well-formed, but it
//! is never dereferenced on write and deleting a product leaves orders alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{checked_number, Numeric, Resource, WriteContext};
use crate::ids::ResourceId;
use crate::query::FilterField;
use crate::repository::RepositoryResult;
use crate::validation::{self, FieldViolation, ValidationErrors};

/// Stored order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: ResourceId,
    pub name: String,
    pub shopping_cart: ShoppingCart,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub obs: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingCart {
    pub total: f64,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// Only the product reference is required; pricing details are optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
}

/// Cart as submitted by a client
#[derive(Debug, Clone, Deserialize)]
pub struct CartInput {
    pub total: Numeric,
    #[serde(default)]
    pub items: Vec<CartItemInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product: String,
    #[serde(default)]
    pub promo_price: Option<Numeric>,
    #[serde(default)]
    pub discount_percent: Option<Numeric>,
    #[serde(default)]
    pub quantity: Option<Numeric>,
}

/// Order create payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub name: String,
    pub shopping_cart: CartInput,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub obs: Option<String>,
}

/// Order partial update; a cart replaces the stored one wholesale
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrder {
    pub name: Option<String>,
    pub shopping_cart: Option<CartInput>,
    pub disabled: Option<bool>,
    pub obs: Option<String>,
}

/// Public order representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: ResourceId,
    pub name: String,
    /// Shopping cart total
    pub price: f64,
    pub disabled: bool,
}

/// Project an order into its public fields
pub fn transform(order: &Order) -> OrderView {
    OrderView {
        id: order.id,
        name: order.name.clone(),
        price: order.shopping_cart.total,
        disabled: order.disabled,
    }
}

impl Order {
    /// Product ids referenced by the cart, first occurrence order
    pub fn product_ids(&self) -> Vec<ResourceId> {
        let mut ids: Vec<ResourceId> = Vec::with_capacity(self.shopping_cart.items.len());
        for item in &self.shopping_cart.items {
            if !ids.contains(&item.product) {
                ids.push(item.product);
            }
        }
        ids
    }
}

fn optional_finite(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&Numeric>,
) -> Option<f64> {
    value.map(|value| checked_number(errors, field, value, |n| validation::finite(field, n)))
}

fn build_cart(errors: &mut ValidationErrors, input: &CartInput) -> ShoppingCart {
    let total = checked_number(errors, "shoppingCart.total", &input.total, |n| {
        validation::finite("shoppingCart.total", n)
    });

    let items = input
        .items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let promo_price = optional_finite(
                errors,
                "shoppingCart.items.promoPrice",
                item.promo_price.as_ref(),
            );
            let discount_percent = optional_finite(
                errors,
                "shoppingCart.items.discountPercent",
                item.discount_percent.as_ref(),
            );
            let quantity =
                optional_finite(errors, "shoppingCart.items.quantity", item.quantity.as_ref());
            match item.product.trim().parse::<ResourceId>() {
                Ok(product) => Some(CartItem {
                    product,
                    promo_price,
                    discount_percent,
                    quantity,
                }),
                Err(_) => {
                    errors.push(FieldViolation::new(
                        "shoppingCart.items.product",
                        format!("item {} must reference a valid product id", index),
                    ));
                    None
                }
            }
        })
        .collect();

    ShoppingCart { total, items }
}

impl Resource for Order {
    type Create = CreateOrder;
    type Update = UpdateOrder;
    type View = OrderView;

    const COLLECTION: &'static str = "orders";
    const ENTITY: &'static str = "Order";
    const FILTERABLE: &'static [FilterField] =
        &[FilterField::text("name"), FilterField::flag("disabled")];

    fn id(&self) -> ResourceId {
        self.id
    }

    fn build(id: ResourceId, data: CreateOrder, ctx: &WriteContext<'_>) -> RepositoryResult<Self> {
        let mut errors = ValidationErrors::new();
        errors.record(validation::required_text("name", &data.name));
        let shopping_cart = build_cart(&mut errors, &data.shopping_cart);
        errors.into_result()?;

        Ok(Self {
            id,
            name: data.name.trim().to_string(),
            shopping_cart,
            disabled: data.disabled.unwrap_or(false),
            obs: data.obs.unwrap_or_default(),
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    fn merge(&mut self, data: UpdateOrder, ctx: &WriteContext<'_>) -> RepositoryResult<()> {
        let mut errors = ValidationErrors::new();

        if let Some(name) = data.name {
            errors.record(validation::required_text("name", &name));
            self.name = name.trim().to_string();
        }
        if let Some(cart) = data.shopping_cart {
            self.shopping_cart = build_cart(&mut errors, &cart);
        }
        if let Some(disabled) = data.disabled {
            self.disabled = disabled;
        }
        if let Some(obs) = data.obs {
            self.obs = obs;
        }

        errors.into_result()?;
        self.updated_at = ctx.now;
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.record(validation::required_text("name", &self.name));
        errors.record(validation::finite("shoppingCart.total", self.shopping_cart.total));
        for item in &self.shopping_cart.items {
            let details = [
                ("shoppingCart.items.promoPrice", item.promo_price),
                ("shoppingCart.items.discountPercent", item.discount_percent),
                ("shoppingCart.items.quantity", item.quantity),
            ];
            for (field, value) in details {
                if let Some(value) = value {
                    errors.record(validation::finite(field, value));
                }
            }
        }
        errors.into_result()
    }

    fn view(&self) -> OrderView {
        transform(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PasswordHasher;
    use serde_json::json;

    fn build(value: serde_json::Value) -> RepositoryResult<Order> {
        let hasher = PasswordHasher::default();
        let ctx = WriteContext {
            now: Utc::now(),
            hasher: &hasher,
        };
        Order::build(ResourceId::new(), serde_json::from_value(value).unwrap(), &ctx)
    }

    #[test]
    fn test_build_order() {
        let product = ResourceId::new();
        let order = build(json!({
            "name": "Weekly groceries",
            "shoppingCart": {
                "total": 42.5,
                "items": [
                    {"product": product.to_string(), "promoPrice": 10, "discountPercent": "5", "quantity": 2},
                    {"product": product.to_string(), "promoPrice": 22.5, "discountPercent": 0, "quantity": 1}
                ]
            },
            "obs": "leave at door"
        }))
        .unwrap();

        assert_eq!(order.shopping_cart.items.len(), 2);
        assert_eq!(order.shopping_cart.items[0].discount_percent, Some(5.0));
        assert_eq!(order.product_ids(), vec![product]);
        assert!(!order.disabled);
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_cart_item_needs_only_a_product() {
        let product = ResourceId::new();
        let order = build(json!({
            "name": "  Quick order \t",
            "shoppingCart": {
                "total": 3,
                "items": [{"product": product.to_string(), "quantity": 1}]
            }
        }))
        .unwrap();

        assert_eq!(order.name, "Quick order");
        let item = &order.shopping_cart.items[0];
        assert_eq!(item.quantity, Some(1.0));
        assert_eq!(item.promo_price, None);
        assert_eq!(item.discount_percent, None);
        assert!(order.validate().is_ok());

        let stored = serde_json::to_value(item).unwrap();
        assert!(stored.get("promoPrice").is_none());

        let err = build(json!({
            "name": "Order",
            "shoppingCart": {
                "total": 3,
                "items": [{"product": product.to_string(), "promoPrice": "cheap"}]
            }
        }))
        .unwrap_err();
        assert!(err.violations.unwrap().has_field("shoppingCart.items.promoPrice"));
    }

    #[test]
    fn test_invalid_order() {
        let err = build(json!({
            "name": "   ",
            "shoppingCart": {
                "total": "lots",
                "items": [
                    {"product": "not-an-id", "promoPrice": 1, "discountPercent": 0, "quantity": 1}
                ]
            }
        }))
        .unwrap_err();
        let violations = err.violations.unwrap();
        assert!(violations.has_field("name"));
        assert!(violations.has_field("shoppingCart.total"));
        assert!(violations.has_field("shoppingCart.items.product"));
    }

    #[test]
    fn test_view_price_is_cart_total() {
        let order = build(json!({"name": "Order", "shoppingCart": {"total": 9.99}})).unwrap();
        let view = serde_json::to_value(transform(&order)).unwrap();
        assert_eq!(view["price"], json!(9.99));
        assert_eq!(view.as_object().unwrap().len(), 4);
        assert!(view.get("shoppingCart").is_none());
        assert!(view.get("obs").is_none());
    }

    #[test]
    fn test_merge_replaces_cart() {
        let hasher = PasswordHasher::default();
        let ctx = WriteContext {
            now: Utc::now(),
            hasher: &hasher,
        };
        let mut order = build(json!({"name": "Order", "shoppingCart": {"total": 1}})).unwrap();
        let update: UpdateOrder = serde_json::from_value(json!({
            "shoppingCart": {"total": 5, "items": []},
            "disabled": true
        }))
        .unwrap();
        order.merge(update, &ctx).unwrap();
        assert_eq!(order.shopping_cart.total, 5.0);
        assert!(order.disabled);
        assert_eq!(order.name, "Order");

        let update: UpdateOrder = serde_json::from_value(json!({"name": " Renamed "})).unwrap();
        order.merge(update, &ctx).unwrap();
        assert_eq!(order.name, "Renamed");
    }
}
