use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::{ImageUpload, ProductFields, ProductList, ProductUpload, SearchQuery},
    error::{AppError, AppResult},
    middleware::auth::AdminGate,
    models::Product,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/product", axum::routing::post(create_product))
        .route(
            "/product/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/product/{id}/image", get(get_product_image))
}

/// Split a product form into its `product` JSON part and optional `imageFile`.
async fn read_product_form(
    mut multipart: Multipart,
) -> AppResult<(ProductFields, Option<ImageUpload>)> {
    let mut product_json = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("product") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                product_json = Some(text);
            }
            Some("imageFile") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if let Some(file_name) = file_name.filter(|n| !n.is_empty()) {
                    image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let raw = product_json.ok_or_else(|| AppError::BadRequest("Missing product JSON".into()))?;
    Ok((ProductFields::from_json(&raw)?, image))
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "List products, newest first", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::list_products(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/search",
    params(
        ("keyword" = Option<String>, Query, description = "Matched against name, brand and category")
    ),
    responses(
        (status = 200, description = "Matching products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let keyword = query.keyword.unwrap_or_default();
    Ok(Json(
        product_service::search_products(&state, &keyword).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(product_service::get_product(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/product/{id}/image",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Product or image not found"),
    ),
    tag = "Products"
)]
pub async fn get_product_image(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let (bytes, mimetype) = product_service::product_image(&state, id).await?;
    Ok(([(header::CONTENT_TYPE, mimetype)], bytes))
}

#[utoipa::path(
    post,
    path = "/api/product",
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Create product", body = ApiResponse<Product>),
        (status = 400, description = "Invalid or missing fields"),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    admin: AdminGate,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let (fields, image) = read_product_form(multipart).await?;
    tracing::debug!(admin = ?admin.user.map(|u| u.user_id), "creating product");
    let resp = product_service::create_product(&state, fields, image).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    admin: AdminGate,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let (fields, image) = read_product_form(multipart).await?;
    tracing::debug!(admin = ?admin.user.map(|u| u.user_id), product_id = %id, "updating product");
    Ok(Json(
        product_service::update_product(&state, id, fields, image).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminGate,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(product_service::delete_product(&state, id).await?))
}
