use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartList},
    entity::{
        Products,
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
    },
    error::{AppError, AppResult},
    models::CartLine,
    money::from_minor_units,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_cart(state: &AppState, user_id: Uuid) -> AppResult<ApiResponse<CartList>> {
    let items = cart_lines(&state.orm, user_id).await?;
    let meta = Meta::new(items.len() as i64);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

/// Lines of a user's cart joined with their products, oldest first.
pub async fn cart_lines<C>(conn: &C, user_id: Uuid) -> Result<Vec<CartLine>, DbErr>
where
    C: ConnectionTrait,
{
    let rows = CartItems::find()
        .find_also_related(Products)
        .filter(CartCol::UserId.eq(user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(line, product)| {
            product.map(|product| CartLine {
                id: product.id,
                name: product.name,
                price: from_minor_units(product.price),
                quantity: line.quantity,
                stock_quantity: product.stock_quantity,
            })
        })
        .collect())
}

/// Insert the line, or overwrite its quantity when the product is already in
/// the cart.
pub async fn add_to_cart(
    state: &AppState,
    user_id: Uuid,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product_exists = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .is_some();
    if !product_exists {
        return Err(AppError::BadRequest("product not found".to_string()));
    }

    let existing = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user_id))
                .add(CartCol::ProductId.eq(payload.product_id)),
        )
        .one(&state.orm)
        .await?;

    match existing {
        Some(line) => {
            let mut active: CartActive = line.into();
            active.quantity = Set(payload.quantity);
            active.update(&state.orm).await?;
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                product_id: Set(payload.product_id),
                quantity: Set(payload.quantity),
                created_at: Set(Utc::now().into()),
            }
            .insert(&state.orm)
            .await?;
        }
    }
    tracing::debug!(
        %user_id,
        product_id = %payload.product_id,
        quantity = payload.quantity,
        "cart updated"
    );

    Ok(ApiResponse::success(
        "Cart updated successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Removing a product that is not in the cart is not an error.
pub async fn remove_from_cart(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Item removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn empty_cart(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    clear_cart(&state.orm, user_id).await?;
    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Delete every line of the user's cart on `conn`, which may be an open
/// transaction. Returns the number of lines removed.
pub async fn clear_cart<C>(conn: &C, user_id: Uuid) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
