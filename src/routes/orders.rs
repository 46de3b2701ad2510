use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderPlaced, PlaceOrderRequest},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_owner},
    models::OrderSummary,
    services::order_service::{self, ClaimedItem},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{user_id}", get(list_orders).post(place_order))
}

#[utoipa::path(
    post,
    path = "/api/orders/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User whose cart is checked out")
    ),
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderPlaced),
        (status = 400, description = "Empty cart, invalid line or insufficient stock"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Storage failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderPlaced>)> {
    ensure_owner(&user, user_id)?;
    let items: Vec<ClaimedItem> = payload
        .cart_items
        .into_iter()
        .map(ClaimedItem::from)
        .collect();

    let placed = order_service::place_order(&state.orm, user_id, &items).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderPlaced {
            message: "Order placed successfully".to_string(),
            order_id: placed.order_id,
            total_price: placed.total_price,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "Owner of the orders")
    ),
    responses(
        (status = 200, description = "Orders, most recent first", body = Vec<OrderSummary>),
        (status = 500, description = "Storage failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<OrderSummary>>> {
    ensure_owner(&user, user_id)?;
    let orders = order_service::list_orders(&state.orm, user_id).await?;
    Ok(Json(orders))
}
