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
    services::customers::{
        CreateCustomerRequest, CustomerFilter, CustomerListResponse, CustomerResponse,
        UpdateCustomerRequest,
    },
    ApiResponse, AppState,
};

use super::common::Pagination;

/// Routes scoped under `/api/customers`.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(deactivate_customer),
        )
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CustomerListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

/// List customers
#[utoipa::path(
    get,
    path = "/api/customers",
    params(CustomerListQuery, Pagination),
    responses(
        (status = 200, description = "Customers retrieved", body = ApiResponse<CustomerListResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<CustomerListResponse>>, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state
        .services
        .customers
        .list_customers(
            CustomerFilter {
                status: query.status,
                search: query.search,
            },
            page,
            per_page,
        )
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Create a customer
#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = ApiResponse<CustomerResponse>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerResponse>>), ServiceError> {
    let customer = state.services.customers.create_customer(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}

/// Fetch one customer
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer retrieved", body = ApiResponse<CustomerResponse>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CustomerResponse>>, ServiceError> {
    let customer = state.services.customers.get_customer(id).await?;
    Ok(Json(ApiResponse::success(customer)))
}

/// Update a customer
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<CustomerResponse>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<ApiResponse<CustomerResponse>>, ServiceError> {
    let customer = state.services.customers.update_customer(id, request).await?;
    Ok(Json(ApiResponse::success(customer)))
}

/// Deactivate a customer (accounts are never hard-deleted)
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer deactivated", body = ApiResponse<CustomerResponse>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Customers"
)]
pub async fn deactivate_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CustomerResponse>>, ServiceError> {
    let customer = state.services.customers.deactivate_customer(id).await?;
    Ok(Json(ApiResponse::success(customer)))
}
