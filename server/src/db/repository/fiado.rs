//! Fiado Repository
//!
//! Read queries for the debtor views plus [`SqliteLedgerStore`], the
//! production backend of the settlement core. Settlement writes go through
//! the store only; nothing else mutates ledger rows.

use async_trait::async_trait;
use shared::models::{DebtorSummary, FiadoPayment, FiadoSaleDetail, FiadoSaleItem};
use sqlx::SqlitePool;

use super::RepoResult;
use crate::ledger::{LedgerError, LedgerResult, LedgerSale, LedgerStore, SaleUpdate};

/// Customers with open fiado sales and what they owe, largest debt first
pub async fn find_debtors(pool: &SqlitePool) -> RepoResult<Vec<DebtorSummary>> {
    let rows = sqlx::query_as::<_, DebtorSummary>(
        "SELECT c.id, c.name, ROUND(SUM(s.total - s.amount_paid), 2) AS total_owed \
         FROM customer c \
         JOIN sale s ON s.customer_id = c.id \
         WHERE s.is_fiado = 1 AND s.settled = 0 \
         GROUP BY c.id, c.name \
         HAVING total_owed > 0 \
         ORDER BY total_owed DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// A customer's open fiado sales with their line items
pub async fn customer_detail(
    pool: &SqlitePool,
    customer_id: i64,
) -> RepoResult<Vec<FiadoSaleDetail>> {
    #[derive(sqlx::FromRow)]
    struct SaleRow {
        id: i64,
        customer_id: i64,
        customer_name: String,
        total: f64,
        amount_paid: f64,
        settled: bool,
        created_at: i64,
    }

    let sales = sqlx::query_as::<_, SaleRow>(
        "SELECT s.id, s.customer_id, c.name AS customer_name, s.total, s.amount_paid, s.settled, s.created_at \
         FROM sale s \
         JOIN customer c ON c.id = s.customer_id \
         WHERE s.customer_id = ? AND s.is_fiado = 1 AND s.settled = 0 \
         ORDER BY s.created_at ASC, s.id ASC",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;

    let mut details = Vec::with_capacity(sales.len());
    for sale in sales {
        let items = sqlx::query_as::<_, FiadoSaleItem>(
            "SELECT i.quantity, i.unit_price, p.name AS product_name \
             FROM sale_item i \
             JOIN product p ON p.id = i.product_id \
             WHERE i.sale_id = ? \
             ORDER BY i.id ASC",
        )
        .bind(sale.id)
        .fetch_all(pool)
        .await?;

        details.push(FiadoSaleDetail {
            id: sale.id,
            customer_id: sale.customer_id,
            customer_name: sale.customer_name,
            total: sale.total,
            amount_paid: sale.amount_paid,
            settled: sale.settled,
            created_at: sale.created_at,
            items,
        });
    }
    Ok(details)
}

/// Payment audit trail for one customer, newest first
pub async fn find_payments(pool: &SqlitePool, customer_id: i64) -> RepoResult<Vec<FiadoPayment>> {
    let rows = sqlx::query_as::<_, FiadoPayment>(
        "SELECT id, sale_id, customer_id, amount, note, created_at \
         FROM fiado_payment WHERE customer_id = ? \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// SQLite-backed [`LedgerStore`]
#[derive(Clone)]
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Busy/locked errors are retryable conflicts; everything else is a
/// storage failure
fn map_store_err(err: sqlx::Error) -> LedgerError {
    let msg = err.to_string();
    if msg.contains("database is locked") || msg.contains("database table is locked") {
        LedgerError::Conflict(msg)
    } else {
        LedgerError::Storage(msg)
    }
}

const LEDGER_SALE_SELECT: &str = "SELECT id, customer_id, total, amount_paid, settled, created_at, settled_at FROM sale";

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn load_open_sales(&self, customer_id: i64) -> LedgerResult<Vec<LedgerSale>> {
        let sql = format!(
            "{LEDGER_SALE_SELECT} WHERE customer_id = ? AND is_fiado = 1 AND settled = 0 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, LedgerSale>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_store_err)
    }

    async fn load_sale(&self, sale_id: i64) -> LedgerResult<Option<LedgerSale>> {
        let sql = format!("{LEDGER_SALE_SELECT} WHERE id = ? AND is_fiado = 1");
        sqlx::query_as::<_, LedgerSale>(&sql)
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_store_err)
    }

    async fn apply_updates(&self, updates: &[SaleUpdate]) -> LedgerResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_store_err)?;
        let now = shared::util::now_millis();

        for update in updates {
            // `settled = 0` guard: a row settled since the snapshot was
            // taken fails the whole batch, nothing commits
            let result = sqlx::query(
                "UPDATE sale SET amount_paid = ?1, settled = ?2, settled_at = COALESCE(?3, settled_at) WHERE id = ?4 AND settled = 0",
            )
            .bind(update.new_amount_paid)
            .bind(update.new_settled)
            .bind(update.new_settled_at)
            .bind(update.sale_id)
            .execute(&mut *tx)
            .await
            .map_err(map_store_err)?;

            if result.rows_affected() == 0 {
                return Err(LedgerError::Conflict(format!(
                    "sale {} was settled concurrently",
                    update.sale_id
                )));
            }

            sqlx::query(
                "INSERT INTO fiado_payment (sale_id, customer_id, amount, note, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(update.sale_id)
            .bind(update.customer_id)
            .bind(update.amount_applied)
            .bind(&update.note)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(map_store_err)?;
        }

        tx.commit().await.map_err(map_store_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::{customer, product, sale};
    use shared::models::{CustomerCreate, ProductCreate, SaleCreate, SaleItemInput};

    async fn seed(db: &DbService) -> (i64, i64) {
        let product = product::create(
            &db.pool,
            ProductCreate {
                name: "Tabaco".into(),
                cost_price: 5.0,
                sale_price: 10.0,
                fiado_price: 11.0,
                stock_quantity: 100,
                min_stock: 5,
            },
        )
        .await
        .unwrap();
        let customer = customer::create(&db.pool, CustomerCreate { name: "Maria".into() })
            .await
            .unwrap();
        (customer.id, product.id)
    }

    async fn seed_fiado_sale(db: &DbService, customer_id: i64, product_id: i64, total: f64) -> i64 {
        sale::create(
            &db.pool,
            SaleCreate {
                customer_id: Some(customer_id),
                total,
                is_fiado: true,
                items: vec![SaleItemInput {
                    product_id,
                    quantity: 1,
                    unit_price: total,
                }],
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_open_sales_ordering_and_filtering() {
        let db = DbService::new_in_memory().await.unwrap();
        let (customer_id, product_id) = seed(&db).await;

        let s1 = seed_fiado_sale(&db, customer_id, product_id, 30.0).await;
        let s2 = seed_fiado_sale(&db, customer_id, product_id, 50.0).await;

        let store = SqliteLedgerStore::new(db.pool.clone());
        let open = store.load_open_sales(customer_id).await.unwrap();
        assert_eq!(open.iter().map(|s| s.id).collect::<Vec<_>>(), vec![s1, s2]);

        // Settling the first removes it from the open set
        store
            .apply_updates(&[SaleUpdate {
                sale_id: s1,
                customer_id,
                new_amount_paid: 30.0,
                new_settled: true,
                new_settled_at: Some(shared::util::now_millis()),
                amount_applied: 30.0,
                note: None,
            }])
            .await
            .unwrap();

        let open = store.load_open_sales(customer_id).await.unwrap();
        assert_eq!(open.iter().map(|s| s.id).collect::<Vec<_>>(), vec![s2]);
    }

    #[tokio::test]
    async fn test_apply_updates_writes_audit_rows() {
        let db = DbService::new_in_memory().await.unwrap();
        let (customer_id, product_id) = seed(&db).await;
        let sale_id = seed_fiado_sale(&db, customer_id, product_id, 40.0).await;

        let store = SqliteLedgerStore::new(db.pool.clone());
        store
            .apply_updates(&[SaleUpdate {
                sale_id,
                customer_id,
                new_amount_paid: 15.0,
                new_settled: false,
                new_settled_at: None,
                amount_applied: 15.0,
                note: Some("parcial".into()),
            }])
            .await
            .unwrap();

        let payments = find_payments(&db.pool, customer_id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].sale_id, sale_id);
        assert_eq!(payments[0].amount, 15.0);
        assert_eq!(payments[0].note.as_deref(), Some("parcial"));
    }

    #[tokio::test]
    async fn test_updating_settled_sale_fails_whole_batch() {
        let db = DbService::new_in_memory().await.unwrap();
        let (customer_id, product_id) = seed(&db).await;
        let s1 = seed_fiado_sale(&db, customer_id, product_id, 20.0).await;
        let s2 = seed_fiado_sale(&db, customer_id, product_id, 35.0).await;

        let store = SqliteLedgerStore::new(db.pool.clone());
        store
            .apply_updates(&[SaleUpdate {
                sale_id: s1,
                customer_id,
                new_amount_paid: 20.0,
                new_settled: true,
                new_settled_at: Some(shared::util::now_millis()),
                amount_applied: 20.0,
                note: None,
            }])
            .await
            .unwrap();

        // A batch touching the already-settled sale must not commit the
        // other update either
        let err = store
            .apply_updates(&[
                SaleUpdate {
                    sale_id: s2,
                    customer_id,
                    new_amount_paid: 10.0,
                    new_settled: false,
                    new_settled_at: None,
                    amount_applied: 10.0,
                    note: None,
                },
                SaleUpdate {
                    sale_id: s1,
                    customer_id,
                    new_amount_paid: 25.0,
                    new_settled: true,
                    new_settled_at: None,
                    amount_applied: 5.0,
                    note: None,
                },
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));

        let open = store.load_open_sales(customer_id).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, s2);
        assert_eq!(open[0].amount_paid, 0.0);

        // Only the first settlement left an audit row
        let payments = find_payments(&db.pool, customer_id).await.unwrap();
        assert_eq!(payments.len(), 1);
    }

    #[tokio::test]
    async fn test_debtors_aggregate_outstanding_balances() {
        let db = DbService::new_in_memory().await.unwrap();
        let (customer_id, product_id) = seed(&db).await;
        seed_fiado_sale(&db, customer_id, product_id, 30.0).await;
        let s2 = seed_fiado_sale(&db, customer_id, product_id, 50.0).await;

        let store = SqliteLedgerStore::new(db.pool.clone());
        store
            .apply_updates(&[SaleUpdate {
                sale_id: s2,
                customer_id,
                new_amount_paid: 10.0,
                new_settled: false,
                new_settled_at: None,
                amount_applied: 10.0,
                note: None,
            }])
            .await
            .unwrap();

        let debtors = find_debtors(&db.pool).await.unwrap();
        assert_eq!(debtors.len(), 1);
        assert_eq!(debtors[0].total_owed, 70.0);
    }
}
