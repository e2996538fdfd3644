use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::products::{
        CreateProductRequest, MovementResponse, ProductFilter, ProductListResponse,
        ProductResponse, RestockRequest, UpdateProductRequest,
    },
    ApiResponse, AppState,
};

use super::common::Pagination;

/// Routes scoped under `/api/products`.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/low-stock", get(low_stock))
        .route("/:id", get(get_product).put(update_product))
        .route("/:id/restock", post(restock_product))
        .route("/:id/movements", get(product_movements))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub active_only: Option<bool>,
}

/// List products
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListQuery, Pagination),
    responses(
        (status = 200, description = "Products retrieved", body = ApiResponse<ProductListResponse>),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<ProductListResponse>>, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state
        .services
        .products
        .list_products(
            ProductFilter {
                search: query.search,
                active_only: query.active_only,
            },
            page,
            per_page,
        )
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Products at or below their reorder level
#[utoipa::path(
    get,
    path = "/api/products/low-stock",
    responses(
        (status = 200, description = "Low-stock products", body = ApiResponse<Vec<ProductResponse>>),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn low_stock(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProductResponse>>>, ServiceError> {
    let products = state.services.products.low_stock().await?;
    Ok(Json(ApiResponse::success(products)))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ServiceError> {
    let product = state.services.products.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

/// Fetch one product
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product retrieved", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProductResponse>>, ServiceError> {
    let product = state.services.products.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, ServiceError> {
    let product = state.services.products.update_product(id, request).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Record a manual restock
#[utoipa::path(
    post,
    path = "/api/products/{id}/restock",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn restock_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(request): Json<RestockRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, ServiceError> {
    tracing::info!(product_id = %id, user_id = %user.user_id, "restock requested");
    let product = state.services.products.restock(id, request).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Inventory ledger for one product
#[utoipa::path(
    get,
    path = "/api/products/{id}/movements",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Movements retrieved", body = ApiResponse<Vec<MovementResponse>>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn product_movements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<MovementResponse>>>, ServiceError> {
    let movements = state.services.products.movements(id).await?;
    Ok(Json(ApiResponse::success(movements)))
}
