//! Sale Repository
//!
//! Sale creation is the one multi-table write outside the settlement core:
//! the sale row, its items and the stock decrements commit as a single
//! transaction.

use shared::models::{Sale, SaleCreate, SaleItem};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult};
use crate::ledger::money::{to_decimal, to_f64};

const SALE_SELECT: &str = "SELECT id, customer_id, total, is_fiado, amount_paid, settled, created_at, settled_at FROM sale";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Sale>> {
    let sql = format!("{SALE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_items(pool: &SqlitePool, sale_id: i64) -> RepoResult<Vec<SaleItem>> {
    let rows = sqlx::query_as::<_, SaleItem>(
        "SELECT id, sale_id, product_id, quantity, unit_price, subtotal FROM sale_item WHERE sale_id = ? ORDER BY id ASC",
    )
    .bind(sale_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Record a sale: insert the sale row and its items, decrement stock.
/// All-or-nothing; a fiado sale becomes an open ledger entry, a cash sale
/// is stored already settled.
pub async fn create(pool: &SqlitePool, data: SaleCreate) -> RepoResult<Sale> {
    if !data.total.is_finite() || data.total <= 0.0 {
        return Err(RepoError::Validation(format!(
            "Sale total must be positive, got {}",
            data.total
        )));
    }
    if data.items.is_empty() {
        return Err(RepoError::Validation("Sale must have at least one item".into()));
    }
    if data.is_fiado && data.customer_id.is_none() {
        return Err(RepoError::Validation(
            "A fiado sale must belong to a customer".into(),
        ));
    }

    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    if let Some(customer_id) = data.customer_id {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer WHERE id = ?")
            .bind(customer_id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Err(RepoError::NotFound(format!(
                "Customer {customer_id} not found"
            )));
        }
    }

    // Cash sales are settled at creation so settled == fully-paid holds
    // across the whole sale table
    let (amount_paid, settled, settled_at) = if data.is_fiado {
        (0.0, false, None)
    } else {
        (data.total, true, Some(now))
    };

    let result = sqlx::query(
        "INSERT INTO sale (customer_id, total, is_fiado, amount_paid, settled, created_at, settled_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(data.customer_id)
    .bind(data.total)
    .bind(data.is_fiado)
    .bind(amount_paid)
    .bind(settled)
    .bind(now)
    .bind(settled_at)
    .execute(&mut *tx)
    .await?;
    let sale_id = result.last_insert_rowid();

    for item in &data.items {
        if item.quantity <= 0 {
            return Err(RepoError::Validation(format!(
                "Item quantity must be positive, got {}",
                item.quantity
            )));
        }

        let subtotal = to_f64(to_decimal(item.unit_price) * rust_decimal::Decimal::from(item.quantity));
        sqlx::query(
            "INSERT INTO sale_item (sale_id, product_id, quantity, unit_price, subtotal) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(sale_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(subtotal)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            "UPDATE product SET stock_quantity = stock_quantity - ?1, updated_at = ?2 WHERE id = ?3 AND stock_quantity >= ?1",
        )
        .bind(item.quantity)
        .bind(now)
        .bind(item.product_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            // Either the product is missing or stock is insufficient;
            // the rollback undoes the sale either way
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE id = ?")
                .bind(item.product_id)
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                return Err(RepoError::NotFound(format!(
                    "Product {} not found",
                    item.product_id
                )));
            }
            return Err(RepoError::Validation(format!(
                "Insufficient stock for product {}",
                item.product_id
            )));
        }
    }

    tx.commit().await?;

    find_by_id(pool, sale_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create sale".into()))
}
