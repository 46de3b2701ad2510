use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{order_items, orders, orders::OrderStatus, products, users},
    money::from_minor_units,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub product_available: bool,
    pub stock_quantity: i32,
    pub image_name: Option<String>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            brand: model.brand,
            description: model.description,
            price: from_minor_units(model.price),
            category: model.category,
            release_date: model.release_date,
            product_available: model.product_available,
            stock_quantity: model.stock_quantity,
            image_name: model.image_filename,
        }
    }
}

/// A cart line joined with the product it points at.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    /// Product id.
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

impl From<order_items::Model> for OrderLine {
    fn from(model: order_items::Model) -> Self {
        Self {
            product_id: model.product_id,
            quantity: model.quantity,
            price: from_minor_units(model.price),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub total_price: Decimal,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<OrderLine>,
}

impl OrderSummary {
    pub fn from_entity(order: orders::Model, items: Vec<order_items::Model>) -> Self {
        Self {
            order_id: order.id,
            total_price: from_minor_units(order.total_price),
            order_date: order.created_at.with_timezone(&Utc),
            status: order.status,
            items: items.into_iter().map(OrderLine::from).collect(),
        }
    }
}
