use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    services::drivers::{CreateDriverRequest, DriverResponse, UpdateDriverRequest},
    ApiResponse, AppState,
};

/// Routes scoped under `/api/drivers`.
pub fn driver_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_drivers).post(create_driver))
        .route("/:id", get(get_driver).put(update_driver))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DriverListQuery {
    pub active_only: Option<bool>,
}

/// List drivers
#[utoipa::path(
    get,
    path = "/api/drivers",
    params(DriverListQuery),
    responses(
        (status = 200, description = "Drivers retrieved", body = ApiResponse<Vec<DriverResponse>>),
    ),
    security(("Bearer" = [])),
    tag = "Drivers"
)]
pub async fn list_drivers(
    State(state): State<AppState>,
    Query(query): Query<DriverListQuery>,
) -> Result<Json<ApiResponse<Vec<DriverResponse>>>, ServiceError> {
    let drivers = state
        .services
        .drivers
        .list_drivers(query.active_only.unwrap_or(false))
        .await?;
    Ok(Json(ApiResponse::success(drivers)))
}

/// Register a driver
#[utoipa::path(
    post,
    path = "/api/drivers",
    request_body = CreateDriverRequest,
    responses(
        (status = 201, description = "Driver created", body = ApiResponse<DriverResponse>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Drivers"
)]
pub async fn create_driver(
    State(state): State<AppState>,
    Json(request): Json<CreateDriverRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DriverResponse>>), ServiceError> {
    let driver = state.services.drivers.create_driver(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(driver))))
}

/// Fetch one driver
#[utoipa::path(
    get,
    path = "/api/drivers/{id}",
    params(("id" = Uuid, Path, description = "Driver ID")),
    responses(
        (status = 200, description = "Driver retrieved", body = ApiResponse<DriverResponse>),
        (status = 404, description = "Driver not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Drivers"
)]
pub async fn get_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DriverResponse>>, ServiceError> {
    let driver = state.services.drivers.get_driver(id).await?;
    Ok(Json(ApiResponse::success(driver)))
}

/// Update a driver
#[utoipa::path(
    put,
    path = "/api/drivers/{id}",
    params(("id" = Uuid, Path, description = "Driver ID")),
    request_body = UpdateDriverRequest,
    responses(
        (status = 200, description = "Driver updated", body = ApiResponse<DriverResponse>),
        (status = 404, description = "Driver not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Drivers"
)]
pub async fn update_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDriverRequest>,
) -> Result<Json<ApiResponse<DriverResponse>>, ServiceError> {
    let driver = state.services.drivers.update_driver(id, request).await?;
    Ok(Json(ApiResponse::success(driver)))
}
