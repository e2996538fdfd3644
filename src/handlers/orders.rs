use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::orders::{
        CreateOrderRequest, OrderFilter, OrderListResponse, OrderResponse,
        UpdateOrderStatusRequest,
    },
    ApiResponse, AppState,
};

use super::common::Pagination;

/// Routes scoped under `/api/orders`.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
        .route("/:id/cancel", post(cancel_order))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub route_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

/// List orders
#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery, Pagination),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<OrderListResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<OrderListResponse>>, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state
        .services
        .orders
        .list_orders(
            OrderFilter {
                status: query.status,
                customer_id: query.customer_id,
                route_code: query.route_code,
            },
            page,
            per_page,
        )
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Create an order
///
/// Decrements stock for each line inside one transaction and records the
/// movements in the inventory ledger.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    tracing::info!(user_id = %user.user_id, "order creation requested");
    let order = state.services.orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// Fetch one order with its items
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Update an order's status
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid status transition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.orders.update_order_status(id, request).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Cancel an order
///
/// Restores the stock its items decremented; cancelling twice is a no-op.
#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(request): Json<CancelOrderRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    tracing::info!(order_id = %id, user_id = %user.user_id, "order cancellation requested");
    let order = state.services.orders.cancel_order(id, request.reason).await?;
    Ok(Json(ApiResponse::success(order)))
}
