mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

async fn seed_order(app: &TestApp, quantity: i64) -> String {
    let response = app
        .request(
            Method::POST,
            "/api/customers",
            Some(json!({"name": "Harbour Gym", "address": "2 Pier Road"})),
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
                "stock": 100,
                "reorder_level": 10
            })),
        )
        .await;
    let product_id = TestApp::read_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request(
            Method::POST,
            "/api/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [{"product_id": product_id, "quantity": quantity}]
            })),
        )
        .await;
    TestApp::read_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn invoice_totals_and_balance_follow_the_order() {
    let app = TestApp::new().await;
    let order_id = seed_order(&app, 10).await;

    let response = app
        .request(
            Method::POST,
            "/api/invoices",
            Some(json!({"order_id": order_id})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = TestApp::read_json(response).await;

    // 10 x 10.00 subtotal, 8% tax.
    assert_eq!(body["data"]["subtotal"], "100.00");
    assert_eq!(body["data"]["tax_amount"], "8.00");
    assert_eq!(body["data"]["total"], "108.00");
    assert_eq!(body["data"]["balance"], "108.00");
    assert_eq!(body["data"]["status"], "pending");

    // Raising a second invoice for the same order conflicts.
    let response = app
        .request(
            Method::POST,
            "/api/invoices",
            Some(json!({"order_id": order_id})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn payments_clamp_balance_and_flip_status() {
    let app = TestApp::new().await;
    let order_id = seed_order(&app, 10).await;

    let response = app
        .request(
            Method::POST,
            "/api/invoices",
            Some(json!({"order_id": order_id})),
        )
        .await;
    let invoice_id = TestApp::read_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request(
            Method::POST,
            &format!("/api/invoices/{invoice_id}/payments"),
            Some(json!({"amount": "50.00"})),
        )
        .await;
    let body = TestApp::read_json(response).await;
    assert_eq!(body["data"]["balance"], "58.00");
    assert_eq!(body["data"]["status"], "pending");

    // Overpayment: balance clamps at zero, invoice flips to paid.
    let response = app
        .request(
            Method::POST,
            &format!("/api/invoices/{invoice_id}/payments"),
            Some(json!({"amount": "100.00"})),
        )
        .await;
    let body = TestApp::read_json(response).await;
    assert_eq!(body["data"]["balance"], "0");
    assert_eq!(body["data"]["status"], "paid");

    // Non-positive amounts are rejected.
    let response = app
        .request(
            Method::POST,
            &format!("/api/invoices/{invoice_id}/payments"),
            Some(json!({"amount": "0"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn pdf_generation_memoizes_url_and_overwrites() {
    let app = TestApp::new().await;
    let order_id = seed_order(&app, 2).await;

    let response = app
        .request(
            Method::POST,
            "/api/invoices",
            Some(json!({"order_id": order_id})),
        )
        .await;
    let invoice_id = TestApp::read_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request(Method::GET, &format!("/api/invoices/{invoice_id}/pdf"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::read_json(response).await;
    let url = body["data"]["url"].as_str().unwrap().to_string();
    assert_eq!(url, format!("/static/invoices/{invoice_id}.pdf"));

    // The URL is memoized on the invoice row.
    let response = app
        .request(Method::GET, &format!("/api/invoices/{invoice_id}"), None)
        .await;
    let body = TestApp::read_json(response).await;
    assert_eq!(body["data"]["pdf_url"].as_str().unwrap(), url);

    // Requesting again re-renders and returns the same location.
    let response = app
        .request(Method::GET, &format!("/api/invoices/{invoice_id}/pdf"), None)
        .await;
    let body = TestApp::read_json(response).await;
    assert_eq!(body["data"]["url"].as_str().unwrap(), url);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn pdf_for_unknown_invoice_is_404() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::GET,
            "/api/invoices/00000000-0000-0000-0000-000000000001/pdf",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
