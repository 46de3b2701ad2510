use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartList},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_owner},
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{user_id}",
            get(cart_list).post(add_to_cart).delete(clear_cart),
        )
        .route("/{user_id}/{product_id}", delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "Cart owner")
    ),
    responses(
        (status = 200, description = "Cart lines with product details", body = ApiResponse<CartList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    ensure_owner(&user, user_id)?;
    Ok(Json(cart_service::list_cart(&state, user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/cart/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "Cart owner")
    ),
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add or update cart item"),
        (status = 400, description = "Bad request"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_owner(&user, user_id)?;
    Ok(Json(cart_service::add_to_cart(&state, user_id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{user_id}/{product_id}",
    params(
        ("user_id" = Uuid, Path, description = "Cart owner"),
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "OK"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_owner(&user, user_id)?;
    Ok(Json(
        cart_service::remove_from_cart(&state, user_id, product_id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "Cart owner")
    ),
    responses(
        (status = 200, description = "Cart cleared"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_owner(&user, user_id)?;
    Ok(Json(cart_service::empty_cart(&state, user_id).await?))
}
