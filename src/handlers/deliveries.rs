use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    services::deliveries::{
        AssignDriverRequest, CreateDeliveryRequest, DeliveryFilter, DeliveryListResponse,
        DeliveryResponse, UpdateDeliveryStatusRequest,
    },
    ApiResponse, AppState,
};

use super::common::Pagination;

/// Routes scoped under `/api/deliveries`.
pub fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_deliveries).post(create_delivery))
        .route("/:id", get(get_delivery))
        .route("/:id/status", put(update_delivery_status))
        .route("/:id/assign", post(assign_driver))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeliveryListQuery {
    pub status: Option<String>,
    pub driver_id: Option<Uuid>,
}

/// List deliveries
#[utoipa::path(
    get,
    path = "/api/deliveries",
    params(DeliveryListQuery, Pagination),
    responses(
        (status = 200, description = "Deliveries retrieved", body = ApiResponse<DeliveryListResponse>),
    ),
    security(("Bearer" = [])),
    tag = "Deliveries"
)]
pub async fn list_deliveries(
    State(state): State<AppState>,
    Query(query): Query<DeliveryListQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<DeliveryListResponse>>, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state
        .services
        .deliveries
        .list_deliveries(
            DeliveryFilter {
                status: query.status,
                driver_id: query.driver_id,
            },
            page,
            per_page,
        )
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Schedule a delivery for an order
#[utoipa::path(
    post,
    path = "/api/deliveries",
    request_body = CreateDeliveryRequest,
    responses(
        (status = 201, description = "Delivery scheduled", body = ApiResponse<DeliveryResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Deliveries"
)]
pub async fn create_delivery(
    State(state): State<AppState>,
    Json(request): Json<CreateDeliveryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DeliveryResponse>>), ServiceError> {
    let delivery = state.services.deliveries.create_delivery(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(delivery))))
}

/// Fetch one delivery
#[utoipa::path(
    get,
    path = "/api/deliveries/{id}",
    params(("id" = Uuid, Path, description = "Delivery ID")),
    responses(
        (status = 200, description = "Delivery retrieved", body = ApiResponse<DeliveryResponse>),
        (status = 404, description = "Delivery not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Deliveries"
)]
pub async fn get_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeliveryResponse>>, ServiceError> {
    let delivery = state.services.deliveries.get_delivery(id).await?;
    Ok(Json(ApiResponse::success(delivery)))
}

/// Update a delivery's status
#[utoipa::path(
    put,
    path = "/api/deliveries/{id}/status",
    params(("id" = Uuid, Path, description = "Delivery ID")),
    request_body = UpdateDeliveryStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<DeliveryResponse>),
        (status = 404, description = "Delivery not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Deliveries"
)]
pub async fn update_delivery_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDeliveryStatusRequest>,
) -> Result<Json<ApiResponse<DeliveryResponse>>, ServiceError> {
    let delivery = state.services.deliveries.update_status(id, request).await?;
    Ok(Json(ApiResponse::success(delivery)))
}

/// Assign a driver to a delivery
#[utoipa::path(
    post,
    path = "/api/deliveries/{id}/assign",
    params(("id" = Uuid, Path, description = "Delivery ID")),
    request_body = AssignDriverRequest,
    responses(
        (status = 200, description = "Driver assigned", body = ApiResponse<DeliveryResponse>),
        (status = 400, description = "Unknown or inactive driver", body = crate::errors::ErrorResponse),
        (status = 404, description = "Delivery not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Deliveries"
)]
pub async fn assign_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignDriverRequest>,
) -> Result<Json<ApiResponse<DeliveryResponse>>, ServiceError> {
    let delivery = state.services.deliveries.assign_driver(id, request).await?;
    Ok(Json(ApiResponse::success(delivery)))
}
