//! Customer Repository

use shared::models::{Customer, CustomerCreate, CustomerUpdate};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult};

const CUSTOMER_SELECT: &str = "SELECT id, name, created_at, updated_at FROM customer";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Customer>> {
    let sql = format!("{CUSTOMER_SELECT} ORDER BY name COLLATE NOCASE ASC");
    let rows = sqlx::query_as::<_, Customer>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Customer>> {
    let sql = format!("{CUSTOMER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: CustomerCreate) -> RepoResult<Customer> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err(RepoError::Validation("Customer name is required".into()));
    }

    // Case-insensitive uniqueness keeps the debtor list unambiguous
    let existing: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM customer WHERE name = ? COLLATE NOCASE")
            .bind(name)
            .fetch_one(pool)
            .await?;
    if existing > 0 {
        return Err(RepoError::Duplicate(format!(
            "Customer '{name}' already exists"
        )));
    }

    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO customer (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
    )
    .bind(name)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create customer".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: CustomerUpdate) -> RepoResult<Customer> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE customer SET name = COALESCE(?1, name), updated_at = ?2 WHERE id = ?3",
    )
    .bind(data.name.map(|n| n.trim().to_string()))
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Customer {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Customer {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    // Ledger rows are never deleted, so their customer must stay too
    let referenced: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale WHERE customer_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if referenced > 0 {
        return Err(RepoError::Validation(
            "Customer has recorded sales and cannot be deleted".into(),
        ));
    }

    let rows = sqlx::query("DELETE FROM customer WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
