use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::products::{ImageUpload, ProductFields, ProductList},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    models::Product,
    money,
    response::{ApiResponse, Meta},
    services::image_store,
    state::AppState,
};

pub async fn list_products(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let items: Vec<Product> = Products::find()
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(items.len() as i64);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

/// Case-insensitive substring match on name, brand and category.
pub async fn search_products(
    state: &AppState,
    keyword: &str,
) -> AppResult<ApiResponse<ProductList>> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Ok(ApiResponse::success(
            "Products",
            ProductList { items: Vec::new() },
            Some(Meta::new(0)),
        ));
    }

    let pattern = format!("%{}%", keyword.to_lowercase());
    let lower_like = |col: Column| Expr::expr(Func::lower(Expr::col(col))).like(pattern.clone());
    let items: Vec<Product> = Products::find()
        .filter(
            Condition::any()
                .add(lower_like(Column::Name))
                .add(lower_like(Column::Brand))
                .add(lower_like(Column::Category)),
        )
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(items.len() as i64);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = find_product(state, id).await?;
    Ok(ApiResponse::success("Product", Product::from(product), None))
}

/// Product row locked for the rest of the surrounding transaction.
pub async fn find_for_update<C>(conn: &C, id: Uuid) -> Result<Option<ProductModel>, DbErr>
where
    C: ConnectionTrait,
{
    Products::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await
}

/// Take `amount` units out of stock unless that would drive it negative.
/// Returns whether the decrement happened.
pub async fn decrement_stock<C>(conn: &C, id: Uuid, amount: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let result = Products::update_many()
        .col_expr(
            Column::StockQuantity,
            Expr::col(Column::StockQuantity).sub(amount),
        )
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(Column::Id.eq(id))
        .filter(Column::StockQuantity.gte(amount))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

pub async fn create_product(
    state: &AppState,
    fields: ProductFields,
    image: Option<ImageUpload>,
) -> AppResult<ApiResponse<Product>> {
    let missing = fields.missing_required();
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing fields: {}",
            missing.join(", ")
        )));
    }

    let now = Utc::now().fixed_offset();
    let mut active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(String::new()),
        brand: Set(String::new()),
        description: Set(None),
        price: Set(0),
        category: Set(None),
        release_date: Set(None),
        product_available: Set(true),
        stock_quantity: Set(0),
        image_filename: Set(None),
        image_mimetype: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    apply_fields(&mut active, fields)?;

    let new_image = match image {
        Some(upload) => {
            let stored = store_image(state, &upload).await?;
            active.image_filename = Set(Some(stored.file_name.clone()));
            active.image_mimetype = Set(Some(stored.mimetype));
            Some(stored.file_name)
        }
        None => None,
    };

    let product = match active.insert(&state.orm).await {
        Ok(product) => product,
        Err(err) => {
            discard_image(state, new_image.as_deref()).await;
            return Err(err.into());
        }
    };
    tracing::info!(product_id = %product.id, "product created");

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    id: Uuid,
    fields: ProductFields,
    image: Option<ImageUpload>,
) -> AppResult<ApiResponse<Product>> {
    let existing = find_product(state, id).await?;
    let old_image = existing.image_filename.clone();

    let mut active: ActiveModel = existing.into();
    apply_fields(&mut active, fields)?;

    let new_image = match image {
        Some(upload) => {
            let stored = store_image(state, &upload).await?;
            active.image_filename = Set(Some(stored.file_name.clone()));
            active.image_mimetype = Set(Some(stored.mimetype));
            Some(stored.file_name)
        }
        None => None,
    };
    active.updated_at = Set(Utc::now().fixed_offset());

    // The row must stop naming the old file before the file goes away.
    let product = match active.update(&state.orm).await {
        Ok(product) => product,
        Err(err) => {
            discard_image(state, new_image.as_deref()).await;
            return Err(err.into());
        }
    };
    if new_image.is_some() {
        discard_image(state, old_image.as_deref()).await;
    }
    tracing::info!(product_id = %product.id, "product updated");

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_product(state, id).await?;
    Products::delete_by_id(id).exec(&state.orm).await?;

    if let Some(image) = existing.image_filename {
        image_store::remove(&state.config.upload_folder, &image).await;
    }
    tracing::info!(product_id = %id, "product deleted");

    Ok(ApiResponse::success(
        "deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Image bytes and mimetype of a product.
pub async fn product_image(state: &AppState, id: Uuid) -> AppResult<(Vec<u8>, String)> {
    let product = find_product(state, id).await?;
    let Some(file_name) = product.image_filename else {
        return Err(AppError::NotFound);
    };
    let bytes = image_store::read(&state.config.upload_folder, &file_name)
        .await
        .map_err(|err| {
            tracing::warn!(product_id = %id, error = %err, "image file unreadable");
            AppError::NotFound
        })?;
    let mimetype = product
        .image_mimetype
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok((bytes, mimetype))
}

/// Merge the present fields into `active`, one column at a time.
fn apply_fields(active: &mut ActiveModel, fields: ProductFields) -> AppResult<()> {
    if let Some(name) = fields.name {
        active.name = Set(name);
    }
    if let Some(brand) = fields.brand {
        active.brand = Set(brand);
    }
    if let Some(description) = fields.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = fields.price {
        let minor = money::to_minor_units(price)
            .ok_or_else(|| AppError::BadRequest("Invalid price format".into()))?;
        active.price = Set(minor);
    }
    if let Some(category) = fields.category {
        active.category = Set(Some(category));
    }
    if let Some(release_date) = fields.release_date {
        active.release_date = Set(Some(release_date));
    }
    if let Some(available) = fields.product_available {
        active.product_available = Set(available);
    }
    if let Some(stock) = fields.stock_quantity {
        active.stock_quantity = Set(stock);
    }
    Ok(())
}

async fn find_product(state: &AppState, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

async fn store_image(
    state: &AppState,
    upload: &ImageUpload,
) -> AppResult<image_store::StoredImage> {
    image_store::save(&state.config.upload_folder, upload)
        .await
        .map_err(|err| AppError::Internal(anyhow::anyhow!("failed to store image: {err}")))
}

async fn discard_image(state: &AppState, file_name: Option<&str>) {
    if let Some(file_name) = file_name {
        image_store::remove(&state.config.upload_folder, file_name).await;
    }
}
