//! Product Repository

use shared::models::{Product, ProductCreate, ProductUpdate};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult};

const PRODUCT_SELECT: &str = "SELECT id, name, cost_price, sale_price, fiado_price, stock_quantity, min_stock, created_at, updated_at FROM product";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let sql = format!("{PRODUCT_SELECT} ORDER BY name COLLATE NOCASE ASC");
    let rows = sqlx::query_as::<_, Product>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Products at or below their minimum stock level
pub async fn find_low_stock(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let sql = format!(
        "{PRODUCT_SELECT} WHERE stock_quantity <= min_stock ORDER BY stock_quantity ASC"
    );
    let rows = sqlx::query_as::<_, Product>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    if data.name.trim().is_empty() {
        return Err(RepoError::Validation("Product name is required".into()));
    }

    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO product (name, cost_price, sale_price, fiado_price, stock_quantity, min_stock, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
    )
    .bind(data.name.trim())
    .bind(data.cost_price)
    .bind(data.sale_price)
    .bind(data.fiado_price)
    .bind(data.stock_quantity)
    .bind(data.min_stock)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE product SET name = COALESCE(?1, name), cost_price = COALESCE(?2, cost_price), sale_price = COALESCE(?3, sale_price), fiado_price = COALESCE(?4, fiado_price), stock_quantity = COALESCE(?5, stock_quantity), min_stock = COALESCE(?6, min_stock), updated_at = ?7 WHERE id = ?8",
    )
    .bind(data.name)
    .bind(data.cost_price)
    .bind(data.sale_price)
    .bind(data.fiado_price)
    .bind(data.stock_quantity)
    .bind(data.min_stock)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    // Products referenced by sale items must stay for history
    let referenced: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sale_item WHERE product_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if referenced > 0 {
        return Err(RepoError::Validation(
            "Product has recorded sales and cannot be deleted".into(),
        ));
    }

    let rows = sqlx::query("DELETE FROM product WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
