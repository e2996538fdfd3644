//! HydroPak API Library
//!
//! Back-office system for a water-delivery business: customers, products
//! and stock, orders, invoicing with PDF export, deliveries, drivers and
//! reporting.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthRouterExt;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Envelope for every successful JSON response.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// The protected API surface, nested under `/api` by the binary.
/// Every route requires a bearer token (or the development bypass);
/// `/api/auth/login` is mounted separately and stays open.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/customers", handlers::customers::customer_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/invoices", handlers::invoices::invoice_routes())
        .nest("/deliveries", handlers::deliveries::delivery_routes())
        .nest("/drivers", handlers::drivers::driver_routes())
        .nest("/dashboard", handlers::dashboard::dashboard_routes())
        .nest("/analytics", handlers::analytics::analytics_routes())
        .with_auth()
}

/// Liveness/readiness endpoint; open, mounted at `/health`.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_response_wraps_data() {
        let response = ApiResponse::success(42);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert!(response.message.is_none());
        chrono::DateTime::parse_from_rfc3339(&response.timestamp).expect("timestamp parses");
    }

    #[test]
    fn message_response_has_no_data() {
        let response = ApiResponse::<()>::message("done");
        assert!(response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("done"));
    }
}
