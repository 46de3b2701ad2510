use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::{error::AppError, models::Product};

/// Product fields sent by the admin UI. Every field is optional so the same
/// shape serves create (where some are then required) and partial update.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProductFields {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub product_available: Option<bool>,
    pub stock_quantity: Option<i32>,
}

impl ProductFields {
    /// Parse the `product` JSON part, checking the type of each known key.
    /// An unreadable `releaseDate` counts as absent.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|_| AppError::BadRequest("Invalid product JSON".into()))?;
        let obj = value
            .as_object()
            .ok_or_else(|| AppError::BadRequest("Invalid product JSON".into()))?;

        Ok(Self {
            name: string_field(obj, "name")?,
            brand: string_field(obj, "brand")?,
            description: string_field(obj, "description")?,
            price: price_field(obj)?,
            category: string_field(obj, "category")?,
            release_date: obj
                .get("releaseDate")
                .and_then(Value::as_str)
                .and_then(parse_release_date),
            product_available: match obj.get("productAvailable") {
                None | Some(Value::Null) => None,
                Some(Value::Bool(b)) => Some(*b),
                Some(_) => return Err(invalid_field("productAvailable")),
            },
            stock_quantity: match obj.get("stockQuantity") {
                None | Some(Value::Null) => None,
                Some(v) => Some(
                    v.as_i64()
                        .and_then(|n| i32::try_from(n).ok())
                        .filter(|n| *n >= 0)
                        .ok_or_else(|| invalid_field("stockQuantity"))?,
                ),
            },
        })
    }

    /// Names of the fields a new product cannot do without.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let blank = |s: &Option<String>| s.as_deref().is_none_or(|s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.name) {
            missing.push("name");
        }
        if blank(&self.brand) {
            missing.push("brand");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        if blank(&self.category) {
            missing.push("category");
        }
        if self.stock_quantity.is_none() {
            missing.push("stockQuantity");
        }
        missing
    }
}

fn invalid_field(name: &str) -> AppError {
    AppError::BadRequest(format!("Invalid field: {name}"))
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, AppError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid_field(key)),
    }
}

fn price_field(obj: &Map<String, Value>) -> Result<Option<Decimal>, AppError> {
    let raw = match obj.get("price") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(AppError::BadRequest("Invalid price format".into())),
    };
    Decimal::from_str(&raw)
        .ok()
        .filter(|d| !d.is_sign_negative())
        .map(Some)
        .ok_or_else(|| AppError::BadRequest("Invalid price format".into()))
}

/// Accepts `YYYY-MM-DD` optionally followed by a time part.
fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

/// An uploaded image as read from the multipart body.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Multipart form accepted by product create and update.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct ProductUpload {
    /// JSON object with camelCase product fields.
    product: String,
    #[schema(value_type = Option<String>, format = Binary)]
    image_file: Option<Vec<u8>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
