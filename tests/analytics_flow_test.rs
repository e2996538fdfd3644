mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

/// Seed one customer, one product and `n` delivered+invoiced orders today.
async fn seed_sales(app: &TestApp, n: usize) {
    let response = app
        .request(
            Method::POST,
            "/api/customers",
            Some(json!({"name": "Hilltop School"})),
        )
        .await;
    let customer_id = TestApp::read_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request(
            Method::POST,
            "/api/products",
            Some(json!({
                "sku": "SKU-19L",
                "name": "19L Bottle",
                "unit": "bottle",
                "cost_price": "4.50",
                "sale_price": "10.00",
                "stock": 500,
                "reorder_level": 10
            })),
        )
        .await;
    let product_id = TestApp::read_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    for _ in 0..n {
        let response = app
            .request(
                Method::POST,
                "/api/orders",
                Some(json!({
                    "customer_id": customer_id,
                    "items": [{"product_id": product_id, "quantity": 5}],
                    "route_code": "NORTH"
                })),
            )
            .await;
        let order_id = TestApp::read_json(response).await["data"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .request(
                Method::POST,
                "/api/invoices",
                Some(json!({"order_id": order_id})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn analytics_report_reconciles_over_the_api() {
    let app = TestApp::new().await;
    seed_sales(&app, 3).await;

    let response = app
        .request(Method::GET, "/api/analytics?preset=last_7", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::read_json(response).await;
    let data = &body["data"];

    assert_eq!(data["kpis"]["orders"], 3);
    assert_eq!(data["kpis"]["customers"], 1);
    // 3 orders x 5 bottles x 10.00, plus 8% tax on each invoice.
    assert_eq!(data["kpis"]["revenue"], "162.00");
    // Prior week was empty: growth pegs at 100%.
    assert_eq!(data["growth"]["revenue_pct"], 100.0);
    assert_eq!(data["growth"]["orders_pct"], 100.0);

    assert_eq!(data["timeseries"].as_array().unwrap().len(), 7);
    assert_eq!(data["channels"][0]["route"], "NORTH");
    assert_eq!(data["channels"][0]["orders"], 3);

    let histogram = data["status_breakdown"].as_array().unwrap();
    let pending = histogram
        .iter()
        .find(|s| s["status"] == "pending")
        .expect("pending bucket");
    assert_eq!(pending["orders"], 3);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn analytics_accepts_post_body_ranges() {
    let app = TestApp::new().await;
    seed_sales(&app, 1).await;

    let response = app
        .request(
            Method::POST,
            "/api/analytics",
            Some(json!({"preset": "last_30"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::read_json(response).await;
    assert_eq!(body["data"]["timeseries"].as_array().unwrap().len(), 30);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn dashboard_metrics_cover_all_blocks() {
    let app = TestApp::new().await;
    seed_sales(&app, 2).await;

    let response = app
        .request(Method::GET, "/api/dashboard/metrics", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::read_json(response).await;
    let data = &body["data"];

    assert_eq!(data["sales"]["orders_today"], 2);
    assert_eq!(data["inventory"]["total_products"], 1);
    assert_eq!(data["receivables"]["open_invoices"], 2);
    assert!(data["deliveries"]["scheduled"].is_number());
    assert!(data["generated_at"].is_string());
}
