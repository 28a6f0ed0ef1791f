//! HTTP-level tests over the full router, in-memory database.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use pos_server::{Config, ServerState};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn setup() -> Router {
    let mut config = Config::with_overrides(":memory:", 0);
    config.admin_password = Some("segredo".into());
    let state = ServerState::initialize_in_memory(&config)
        .await
        .expect("state init");
    pos_server::api::create_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_product(app: &Router, name: &str, price: f64, stock: i64) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/products",
        Some(json!({
            "name": name,
            "cost_price": price / 2.0,
            "sale_price": price,
            "fiado_price": price,
            "stock_quantity": stock,
            "min_stock": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["id"].as_i64().unwrap()
}

async fn create_customer(app: &Router, name: &str) -> i64 {
    let (status, body) = send(app, "POST", "/api/customers", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["id"].as_i64().unwrap()
}

async fn create_fiado_sale(app: &Router, customer_id: i64, product_id: i64, total: f64) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/sales",
        Some(json!({
            "customer_id": customer_id,
            "total": total,
            "is_fiado": true,
            "items": [{ "product_id": product_id, "quantity": 1, "unit_price": total }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_auth_gate() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth",
        Some(json!({ "password": "segredo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "E0000");
    assert_eq!(body["data"]["authorized"], true);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth",
        Some(json!({ "password": "errada" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E3001");
}

#[tokio::test]
async fn test_product_crud() {
    let app = setup().await;

    let id = create_product(&app, "Cigarro X", 10.0, 50).await;

    let (status, body) = send(&app, "GET", &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Cigarro X");
    assert_eq!(body["data"]["stock_quantity"], 50);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/products/{id}"),
        Some(json!({ "sale_price": 12.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sale_price"], 12.5);
    assert_eq!(body["data"]["name"], "Cigarro X");

    let (status, body) = send(&app, "GET", "/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_duplicate_name_rejected() {
    let app = setup().await;

    create_customer(&app, "João").await;
    let (status, body) = send(&app, "POST", "/api/customers", Some(json!({ "name": "João" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E0004");
}

#[tokio::test]
async fn test_cash_sale_decrements_stock_and_settles() {
    let app = setup().await;
    let product_id = create_product(&app, "Isqueiro", 5.0, 10).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/sales",
        Some(json!({
            "customer_id": null,
            "total": 15.0,
            "is_fiado": false,
            "items": [{ "product_id": product_id, "quantity": 3, "unit_price": 5.0 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["settled"], true);
    assert_eq!(body["data"]["amount_paid"], 15.0);

    // The receipt carries the recorded line items
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_id"].as_i64().unwrap(), product_id);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(items[0]["subtotal"], 15.0);

    let (_, body) = send(&app, "GET", &format!("/api/products/{product_id}"), None).await;
    assert_eq!(body["data"]["stock_quantity"], 7);
}

#[tokio::test]
async fn test_sale_with_insufficient_stock_rolls_back() {
    let app = setup().await;
    let product_id = create_product(&app, "Charuto", 30.0, 2).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/sales",
        Some(json!({
            "customer_id": null,
            "total": 90.0,
            "is_fiado": false,
            "items": [{ "product_id": product_id, "quantity": 3, "unit_price": 30.0 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");

    // Stock untouched after the rollback
    let (_, body) = send(&app, "GET", &format!("/api/products/{product_id}"), None).await;
    assert_eq!(body["data"]["stock_quantity"], 2);
}

#[tokio::test]
async fn test_fiado_settlement_flow() {
    let app = setup().await;
    let product_id = create_product(&app, "Tabaco", 30.0, 100).await;
    let customer_id = create_customer(&app, "Maria").await;

    let sale1 = create_fiado_sale(&app, customer_id, product_id, 30.0).await;
    let sale2 = create_fiado_sale(&app, customer_id, product_id, 50.0).await;

    // Debtor listing shows the full tab
    let (status, body) = send(&app, "GET", "/api/fiado", None).await;
    assert_eq!(status, StatusCode::OK);
    let debtors = body["data"].as_array().unwrap();
    assert_eq!(debtors.len(), 1);
    assert_eq!(debtors[0]["id"].as_i64().unwrap(), customer_id);
    assert_eq!(debtors[0]["total_owed"], 80.0);

    // Partial payment: settles the oldest, partially pays the newer
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/fiado/customer/{customer_id}/pay"),
        Some(json!({ "amount": 40.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report = &body["data"];
    assert_eq!(report["applied_amount"], 40.0);
    assert_eq!(report["settled_sales"][0]["id"].as_i64().unwrap(), sale1);
    assert_eq!(report["settled_sales"][0]["original_amount"], 30.0);
    assert_eq!(
        report["partially_paid_sales"][0]["id"].as_i64().unwrap(),
        sale2
    );
    assert_eq!(report["partially_paid_sales"][0]["new_balance"], 40.0);

    // Tab detail reflects the new state, with the audit trail
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/fiado/customer/{customer_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_owed"], 40.0);
    assert_eq!(body["data"]["open_sales"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["payments"].as_array().unwrap().len(), 2);

    // Pay everything that's left
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/fiado/customer/{customer_id}/pay-all"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["settled_count"], 1);
    assert_eq!(body["data"]["total_amount"], 40.0);

    let (_, body) = send(&app, "GET", "/api/fiado", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_fiado_overpayment_rejected() {
    let app = setup().await;
    let product_id = create_product(&app, "Tabaco", 30.0, 100).await;
    let customer_id = create_customer(&app, "Pedro").await;
    create_fiado_sale(&app, customer_id, product_id, 30.0).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/fiado/customer/{customer_id}/pay"),
        Some(json!({ "amount": 50.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E0005");

    // Nothing changed
    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/fiado/customer/{customer_id}"),
        None,
    )
    .await;
    assert_eq!(body["data"]["total_owed"], 30.0);
    assert_eq!(body["data"]["payments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_pay_without_open_sales_is_not_found() {
    let app = setup().await;
    let customer_id = create_customer(&app, "Ana").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/fiado/customer/{customer_id}/pay"),
        Some(json!({ "amount": 10.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E0003");
}

#[tokio::test]
async fn test_single_sale_payment_and_idempotency_guard() {
    let app = setup().await;
    let product_id = create_product(&app, "Fumo", 60.0, 100).await;
    let customer_id = create_customer(&app, "Rui").await;
    let sale_id = create_fiado_sale(&app, customer_id, product_id, 60.0).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/fiado/sales/{sale_id}/pay"),
        Some(json!({ "amount": 25.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["settled"], false);
    assert_eq!(body["data"]["new_balance"], 35.0);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/fiado/sales/{sale_id}/pay"),
        Some(json!({ "amount": 35.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["settled"], true);
    assert_eq!(body["data"]["new_balance"], 0.0);

    // A settled sale never takes another payment
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/fiado/sales/{sale_id}/pay"),
        Some(json!({ "amount": 1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0006");
}

#[tokio::test]
async fn test_dashboard_tracks_ledger() {
    let app = setup().await;
    let product_id = create_product(&app, "Palheiro", 20.0, 100).await;
    let customer_id = create_customer(&app, "Zé").await;

    // One cash sale, one fiado sale
    send(
        &app,
        "POST",
        "/api/sales",
        Some(json!({
            "customer_id": null,
            "total": 20.0,
            "is_fiado": false,
            "items": [{ "product_id": product_id, "quantity": 1, "unit_price": 20.0 }]
        })),
    )
    .await;
    create_fiado_sale(&app, customer_id, product_id, 50.0).await;

    let (status, body) = send(&app, "GET", "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert_eq!(stats["sales_today"], 70.0);
    assert_eq!(stats["cash_sales_today"], 20.0);
    assert_eq!(stats["fiado_sales_today"], 50.0);
    assert_eq!(stats["fiado_paid_today"], 0.0);
    assert_eq!(stats["open_fiado_total"], 50.0);
    assert_eq!(stats["customer_count"], 1);
    assert_eq!(stats["product_count"], 1);

    // A settlement invalidates the cached snapshot
    send(
        &app,
        "POST",
        &format!("/api/fiado/customer/{customer_id}/pay"),
        Some(json!({ "amount": 30.0 })),
    )
    .await;

    let (_, body) = send(&app, "GET", "/api/dashboard", None).await;
    let stats = &body["data"];
    assert_eq!(stats["fiado_paid_today"], 30.0);
    assert_eq!(stats["open_fiado_total"], 20.0);
}

#[tokio::test]
async fn test_dashboard_chart_zero_fills_months() {
    let app = setup().await;
    let product_id = create_product(&app, "Rapé", 15.0, 100).await;

    send(
        &app,
        "POST",
        "/api/sales",
        Some(json!({
            "customer_id": null,
            "total": 15.0,
            "is_fiado": false,
            "items": [{ "product_id": product_id, "quantity": 1, "unit_price": 15.0 }]
        })),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/dashboard/chart?months=4", None).await;
    assert_eq!(status, StatusCode::OK);
    let points = body["data"].as_array().unwrap();
    assert_eq!(points.len(), 4);

    // Only the current month carries the sale, earlier months are zeros
    let last = &points[3];
    assert_eq!(last["cash_sales"], 15.0);
    for point in &points[..3] {
        assert_eq!(point["cash_sales"], 0.0);
        assert_eq!(point["fiado_sales"], 0.0);
        assert_eq!(point["fiado_paid"], 0.0);
    }
}
