use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    LoaderTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entity::{
        OrderItems, Orders, order_items,
        orders::{self, OrderStatus},
    },
    models::OrderSummary,
    money,
    services::{cart_service, product_service},
};

/// A cart line as presented by the client at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub total_price: Decimal,
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid cart item at position {index}: {reason}")]
    InvalidLine { index: usize, reason: &'static str },

    #[error("Product with id {0} not found")]
    ProductNotFound(Uuid),

    #[error(
        "Not enough stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("Database error")]
    Storage(#[from] DbErr),
}

/// A validated claimed item with its unit price in minor units.
#[derive(Debug)]
struct PricedLine {
    product_id: Uuid,
    quantity: i32,
    unit_price: i64,
}

/// Turn a cart snapshot into a persisted order.
///
/// The order header, its items, every stock decrement and the clearing of the
/// user's cart share one transaction. Any failure after `begin` rolls the
/// transaction back explicitly, so the caller observes either the complete
/// order or no change at all.
#[tracing::instrument(skip(db, items), fields(lines = items.len()))]
pub async fn place_order<C>(
    db: &C,
    user_id: Uuid,
    items: &[ClaimedItem],
) -> Result<PlacedOrder, OrderError>
where
    C: TransactionTrait,
{
    if items.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let lines = price_lines(items)?;
    let (total_price, total_minor) = order_total(items)?;

    let txn = db.begin().await?;
    match write_order(&txn, user_id, &lines, total_minor).await {
        Ok(order_id) => {
            txn.commit().await?;
            tracing::info!(%order_id, total = %total_price, "order placed");
            Ok(PlacedOrder {
                order_id,
                total_price,
            })
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "checkout rollback failed");
            }
            tracing::info!(error = %err, "order rejected");
            Err(err)
        }
    }
}

/// Orders of `user_id`, most recent first, each with its items in cart order.
pub async fn list_orders<C>(db: &C, user_id: Uuid) -> Result<Vec<OrderSummary>, DbErr>
where
    C: ConnectionTrait,
{
    let orders = Orders::find()
        .filter(orders::Column::UserId.eq(user_id))
        .order_by_desc(orders::Column::CreatedAt)
        .order_by_desc(orders::Column::Id)
        .all(db)
        .await?;

    let items = orders
        .load_many(
            OrderItems::find().order_by_asc(order_items::Column::LineNumber),
            db,
        )
        .await?;

    Ok(orders
        .into_iter()
        .zip(items)
        .map(|(order, items)| OrderSummary::from_entity(order, items))
        .collect())
}

async fn write_order(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    lines: &[PricedLine],
    total_minor: i64,
) -> Result<Uuid, OrderError> {
    let order = orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total_price: Set(total_minor),
        status: Set(OrderStatus::Pending),
        created_at: Set(Utc::now().into()),
    }
    .insert(txn)
    .await?;

    for (line_number, line) in lines.iter().enumerate() {
        let product = product_service::find_for_update(txn, line.product_id)
            .await?
            .ok_or(OrderError::ProductNotFound(line.product_id))?;

        if product.stock_quantity < line.quantity {
            return Err(OrderError::InsufficientStock {
                product_id: product.id,
                requested: line.quantity,
                available: product.stock_quantity,
            });
        }

        order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            line_number: Set(line_number as i32),
            quantity: Set(line.quantity),
            price: Set(line.unit_price),
        }
        .insert(txn)
        .await?;

        // The row lock above already serializes competing checkouts; the
        // guarded update keeps stock non-negative on backends without one.
        if !product_service::decrement_stock(txn, line.product_id, line.quantity).await? {
            return Err(OrderError::InsufficientStock {
                product_id: product.id,
                requested: line.quantity,
                available: product.stock_quantity,
            });
        }
    }

    cart_service::clear_cart(txn, user_id).await?;

    Ok(order.id)
}

fn price_lines(items: &[ClaimedItem]) -> Result<Vec<PricedLine>, OrderError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let invalid = |reason| OrderError::InvalidLine { index, reason };
            if item.quantity <= 0 {
                return Err(invalid("quantity must be greater than 0"));
            }
            if item.price.is_sign_negative() {
                return Err(invalid("price must not be negative"));
            }
            if item.price.normalize().scale() > money::MINOR_UNIT_SCALE {
                return Err(invalid("price has more than two decimal places"));
            }
            let unit_price =
                money::to_minor_units(item.price).ok_or_else(|| invalid("price out of range"))?;
            Ok(PricedLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price,
            })
        })
        .collect()
}

/// `Σ price × quantity` rounded to the minor unit, together with its value in
/// minor units. An overflow is blamed on the line that pushed the running
/// total out of range.
fn order_total(items: &[ClaimedItem]) -> Result<(Decimal, i64), OrderError> {
    let mut total = Decimal::ZERO;
    let mut total_minor = 0;
    for (index, item) in items.iter().enumerate() {
        let out_of_range = || OrderError::InvalidLine {
            index,
            reason: "order total out of range",
        };
        total = money::line_total(item.price, item.quantity)
            .and_then(|line| total.checked_add(line))
            .map(money::round_to_minor)
            .ok_or_else(out_of_range)?;
        total_minor = money::to_minor_units(total).ok_or_else(out_of_range)?;
    }
    Ok((total, total_minor))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn item(price: &str, quantity: i32) -> ClaimedItem {
        ClaimedItem {
            product_id: Uuid::new_v4(),
            quantity,
            price: Decimal::from_str(price).unwrap(),
        }
    }

    #[test]
    fn total_is_exact() {
        let (total, total_minor) = order_total(&[item("19.99", 3), item("5.00", 2)]).unwrap();
        assert_eq!(total, Decimal::from_str("69.97").unwrap());
        assert_eq!(total_minor, 6997);
    }

    #[test]
    fn lines_carry_minor_unit_prices() {
        let lines = price_lines(&[item("19.99", 2), item("5", 1)]).unwrap();
        assert_eq!(lines[0].unit_price, 1999);
        assert_eq!(lines[1].unit_price, 500);
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let err = price_lines(&[item("1.00", 1), item("1.00", 0)]).unwrap_err();
        assert!(matches!(err, OrderError::InvalidLine { index: 1, .. }));

        let err = price_lines(&[item("1.00", -3)]).unwrap_err();
        assert!(matches!(err, OrderError::InvalidLine { index: 0, .. }));
    }

    #[test]
    fn rejects_negative_and_sub_cent_prices() {
        assert!(matches!(
            price_lines(&[item("-1.00", 1)]),
            Err(OrderError::InvalidLine { .. })
        ));
        assert!(matches!(
            price_lines(&[item("1.005", 1)]),
            Err(OrderError::InvalidLine { .. })
        ));
        assert!(price_lines(&[item("1.500", 1)]).is_ok());
    }

    #[test]
    fn total_overflow_is_reported_on_the_line() {
        let err = order_total(&[item("1.00", 1), item(&Decimal::MAX.to_string(), 2)]).unwrap_err();
        assert!(matches!(err, OrderError::InvalidLine { index: 1, .. }));
    }

    #[test]
    fn minor_unit_overflow_names_the_line_that_caused_it() {
        // Each line fits on its own; the second one pushes the total past
        // what fits in i64 cents.
        let big = "90000000000000000";
        let err = order_total(&[item(big, 1), item(big, 1), item("1.00", 1)]).unwrap_err();
        assert!(matches!(err, OrderError::InvalidLine { index: 1, .. }));
    }
}
