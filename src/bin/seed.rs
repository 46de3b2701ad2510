use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{Products, Users, products, users},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_id = ensure_user_with_role(&orm, "admin", "admin123", "admin").await?;
    let user_id = ensure_user_with_role(&orm, "shopper", "shopper123", "user").await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    orm: &DatabaseConnection,
    username: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let existing = Users::find()
        .filter(users::Column::Username.eq(username))
        .one(orm)
        .await?;

    let user_id = match existing {
        Some(user) => {
            let mut active = user.into_active_model();
            active.role = Set(role.to_string());
            active.update(orm).await?.id
        }
        None => {
            users::ActiveModel {
                id: Set(Uuid::new_v4()),
                username: Set(username.to_string()),
                password_hash: Set(password_hash),
                role: Set(role.to_string()),
                created_at: Set(Utc::now().into()),
            }
            .insert(orm)
            .await?
            .id
        }
    };

    println!("Ensured user {username} (role={role})");
    Ok(user_id)
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    // (name, brand, category, description, price in cents, stock)
    let catalog = [
        ("Axum Hoodie", "Ferris & Co", "apparel", "Warm hoodie for Rustaceans", 5499, 50),
        ("Ferris Mug", "Ferris & Co", "home", "Coffee tastes better with Ferris", 1299, 100),
        ("Sticker Pack", "Crab Supply", "accessories", "Decorate your laptop", 499, 200),
        ("Async Field Guide", "Crab Supply", "books", "Patterns for async services", 2999, 75),
    ];

    for (name, brand, category, description, price, stock) in catalog {
        let exists = Products::find()
            .filter(products::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let now = Utc::now().fixed_offset();
        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            brand: Set(brand.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(price),
            category: Set(Some(category.to_string())),
            release_date: Set(NaiveDate::from_ymd_opt(2024, 1, 15)),
            product_available: Set(true),
            stock_quantity: Set(stock),
            image_filename: Set(None),
            image_mimetype: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
