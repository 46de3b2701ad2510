#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, Set};
use sea_orm_migration::MigratorTrait;
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{CartItems, OrderItems, Orders, Products, cart_items, products, users},
    migration::Migrator,
    state::AppState,
};
use uuid::Uuid;

/// A migrated, empty database. Uses `TEST_DATABASE_URL` when set, otherwise a
/// private in-memory SQLite database.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let database_url =
        std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let orm = create_orm_conn(&database_url).await?;
    if database_url.starts_with("sqlite:") {
        run_migrations(&orm).await?;
    } else {
        // Drop everything left by an earlier run.
        Migrator::fresh(&orm).await?;
    }
    let mut config = AppConfig::for_database(database_url);
    config.upload_folder = std::env::temp_dir()
        .join(format!("storefront-uploads-{}", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    Ok(AppState::new(orm, config))
}

/// Make every `event` (`INSERT`, `UPDATE` or `DELETE`) on `table` abort with a
/// storage error. SQLite only; returns `false` on other backends so callers
/// can skip.
pub async fn fail_on(state: &AppState, event: &str, table: &str) -> anyhow::Result<bool> {
    if state.orm.get_database_backend() != DbBackend::Sqlite {
        return Ok(false);
    }
    let name = format!("fail_{}_{}", event.to_lowercase(), table);
    state
        .orm
        .execute_unprepared(&format!(
            "CREATE TRIGGER {name} BEFORE {event} ON {table} \
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;"
        ))
        .await?;
    Ok(true)
}

/// Files currently in the state's upload folder.
pub async fn uploaded_files(state: &AppState) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = match tokio::fs::read_dir(&state.config.upload_folder).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(names),
        Err(err) => return Err(err.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

pub async fn create_user(state: &AppState, username: &str, role: &str) -> anyhow::Result<users::Model> {
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        password_hash: Set(String::new()),
        role: Set(role.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(user)
}

/// `price` is in cents.
pub async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<products::Model> {
    let now = Utc::now().fixed_offset();
    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        brand: Set("Ferris & Co".to_string()),
        description: Set(None),
        price: Set(price),
        category: Set(Some("test".to_string())),
        release_date: Set(None),
        product_available: Set(true),
        stock_quantity: Set(stock),
        image_filename: Set(None),
        image_mimetype: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn add_cart_line(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<()> {
    cart_items::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

pub async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} vanished"))?;
    Ok(product.stock_quantity)
}

/// Row counts of (orders, order_items, cart_items).
pub async fn row_counts(state: &AppState) -> anyhow::Result<(u64, u64, u64)> {
    Ok((
        Orders::find().count(&state.orm).await?,
        OrderItems::find().count(&state.orm).await?,
        CartItems::find().count(&state.orm).await?,
    ))
}
