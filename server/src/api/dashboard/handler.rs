//! Dashboard API Handlers
//!
//! Aggregate figures recomputed from the sale and payment tables. Time
//! ranges are computed in Rust (UTC) and passed as millisecond bounds so
//! the SQL stays on plain column comparisons. Responses go through the
//! version-stamped [`DashboardCache`](super::DashboardCache).

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::core::ServerState;
use crate::utils::{AppError, AppResponse, AppResult, ok};

const STATS_CACHE_KEY: &str = "stats";

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub sales_today: f64,
    pub sales_week: f64,
    pub sales_month: f64,
    pub sales_last_month: f64,
    pub cash_sales_today: f64,
    pub fiado_sales_today: f64,
    pub fiado_paid_today: f64,
    /// Outstanding fiado balance across all customers
    pub open_fiado_total: f64,
    pub low_stock_count: i64,
    pub customer_count: i64,
    pub product_count: i64,
    /// Month-over-month growth, percent with one decimal
    pub month_growth: f64,
}

#[derive(Debug, Serialize)]
pub struct ChartPoint {
    /// Month key, `YYYY-MM`
    pub month: String,
    pub cash_sales: f64,
    pub fiado_sales: f64,
    pub fiado_paid: f64,
}

#[derive(Deserialize)]
pub struct ChartQuery {
    pub months: Option<u32>,
}

fn start_of_day_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// First millisecond of the month `delta` months away from (year, month)
fn month_start_millis(year: i32, month: u32, delta: i32) -> i64 {
    let index = year * 12 + month as i32 - 1 + delta;
    let (y, m) = (index.div_euclid(12), index.rem_euclid(12) as u32 + 1);
    NaiveDate::from_ymd_opt(y, m, 1)
        .map(start_of_day_millis)
        .unwrap_or_default()
}

fn month_key(year: i32, month: u32, delta: i32) -> String {
    let index = year * 12 + month as i32 - 1 + delta;
    format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
}

async fn sum_sales(pool: &SqlitePool, where_clause: &str, bounds: &[i64]) -> AppResult<f64> {
    let sql = format!("SELECT COALESCE(SUM(total), 0.0) FROM sale WHERE {where_clause}");
    let mut query = sqlx::query_scalar::<_, f64>(&sql);
    for bound in bounds {
        query = query.bind(bound);
    }
    query
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

async fn count(pool: &SqlitePool, sql: &str) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// GET /api/dashboard - aggregate figures
pub async fn stats(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<serde_json::Value>>> {
    if let Some(cached) = state.dashboard_cache.get(STATS_CACHE_KEY).await {
        return Ok(ok(cached));
    }
    let cache_version = state.dashboard_cache.version();

    let pool = state.pool();
    let now = Utc::now();
    let today = now.date_naive();

    let day_start = start_of_day_millis(today);
    let week_start =
        start_of_day_millis(today - Duration::days(today.weekday().num_days_from_monday() as i64));
    let month_start = month_start_millis(today.year(), today.month(), 0);
    let last_month_start = month_start_millis(today.year(), today.month(), -1);

    let sales_today = sum_sales(pool, "created_at >= ?", &[day_start]).await?;
    let sales_week = sum_sales(pool, "created_at >= ?", &[week_start]).await?;
    let sales_month = sum_sales(pool, "created_at >= ?", &[month_start]).await?;
    let sales_last_month = sum_sales(
        pool,
        "created_at >= ? AND created_at < ?",
        &[last_month_start, month_start],
    )
    .await?;
    let cash_sales_today =
        sum_sales(pool, "created_at >= ? AND is_fiado = 0", &[day_start]).await?;
    let fiado_sales_today =
        sum_sales(pool, "created_at >= ? AND is_fiado = 1", &[day_start]).await?;

    let fiado_paid_today = sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(amount), 0.0) FROM fiado_payment WHERE created_at >= ?",
    )
    .bind(day_start)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    let open_fiado_total = sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(total - amount_paid), 0.0) FROM sale WHERE is_fiado = 1 AND settled = 0",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    let low_stock_count =
        count(pool, "SELECT COUNT(*) FROM product WHERE stock_quantity <= min_stock").await?;
    let customer_count = count(pool, "SELECT COUNT(*) FROM customer").await?;
    let product_count = count(pool, "SELECT COUNT(*) FROM product").await?;

    let month_growth = if sales_last_month > 0.0 {
        let pct = (sales_month - sales_last_month) / sales_last_month * 100.0;
        (pct * 10.0).round() / 10.0
    } else if sales_month > 0.0 {
        100.0
    } else {
        0.0
    };

    let stats = DashboardStats {
        sales_today,
        sales_week,
        sales_month,
        sales_last_month,
        cash_sales_today,
        fiado_sales_today,
        fiado_paid_today,
        open_fiado_total,
        low_stock_count,
        customer_count,
        product_count,
        month_growth,
    };

    let value = serde_json::to_value(&stats)
        .map_err(|e| AppError::Internal(format!("Failed to serialize dashboard: {e}")))?;
    state
        .dashboard_cache
        .put(STATS_CACHE_KEY, cache_version, value.clone())
        .await;

    Ok(ok(value))
}

/// GET /api/dashboard/chart?months=N - per-month sales and payments,
/// missing months zero-filled
pub async fn chart(
    State(state): State<ServerState>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<AppResponse<serde_json::Value>>> {
    let months = query.months.unwrap_or(6).clamp(1, 24) as i32;
    let cache_key = format!("chart:{months}");

    if let Some(cached) = state.dashboard_cache.get(&cache_key).await {
        return Ok(ok(cached));
    }
    let cache_version = state.dashboard_cache.version();

    let pool = state.pool();
    let today = Utc::now().date_naive();
    let range_start = month_start_millis(today.year(), today.month(), -(months - 1));

    #[derive(sqlx::FromRow)]
    struct SaleMonthRow {
        month: String,
        cash_sales: f64,
        fiado_sales: f64,
    }

    let sale_rows = sqlx::query_as::<_, SaleMonthRow>(
        "SELECT strftime('%Y-%m', created_at / 1000, 'unixepoch') AS month, \
                COALESCE(SUM(CASE WHEN is_fiado = 0 THEN total ELSE 0.0 END), 0.0) AS cash_sales, \
                COALESCE(SUM(CASE WHEN is_fiado = 1 THEN total ELSE 0.0 END), 0.0) AS fiado_sales \
         FROM sale WHERE created_at >= ? GROUP BY month",
    )
    .bind(range_start)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    #[derive(sqlx::FromRow)]
    struct PaymentMonthRow {
        month: String,
        fiado_paid: f64,
    }

    let payment_rows = sqlx::query_as::<_, PaymentMonthRow>(
        "SELECT strftime('%Y-%m', created_at / 1000, 'unixepoch') AS month, \
                COALESCE(SUM(amount), 0.0) AS fiado_paid \
         FROM fiado_payment WHERE created_at >= ? GROUP BY month",
    )
    .bind(range_start)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    let points: Vec<ChartPoint> = (0..months)
        .rev()
        .map(|back| {
            let key = month_key(today.year(), today.month(), -back);
            let sale = sale_rows.iter().find(|r| r.month == key);
            let payment = payment_rows.iter().find(|r| r.month == key);
            ChartPoint {
                cash_sales: sale.map(|r| r.cash_sales).unwrap_or_default(),
                fiado_sales: sale.map(|r| r.fiado_sales).unwrap_or_default(),
                fiado_paid: payment.map(|r| r.fiado_paid).unwrap_or_default(),
                month: key,
            }
        })
        .collect();

    let value = serde_json::to_value(&points)
        .map_err(|e| AppError::Internal(format!("Failed to serialize chart: {e}")))?;
    state
        .dashboard_cache
        .put(&cache_key, cache_version, value.clone())
        .await;

    Ok(ok(value))
}
