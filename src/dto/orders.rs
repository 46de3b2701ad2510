use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::order_service::ClaimedItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    #[serde(rename = "cartItems", default)]
    pub cart_items: Vec<CartItemClaim>,
}

/// One cart line as the client last saw it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CartItemClaim {
    /// Product id.
    pub id: Uuid,
    pub price: Decimal,
    pub quantity: i32,
}

impl From<CartItemClaim> for ClaimedItem {
    fn from(claim: CartItemClaim) -> Self {
        ClaimedItem {
            product_id: claim.id,
            quantity: claim.quantity,
            price: claim.price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderPlaced {
    pub message: String,
    pub order_id: Uuid,
    pub total_price: Decimal,
}
