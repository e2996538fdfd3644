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
    auth::AuthUser,
    errors::ServiceError,
    services::invoice_pdf::InvoicePdfResponse,
    services::invoices::{
        CreateInvoiceRequest, InvoiceFilter, InvoiceListResponse, InvoiceResponse,
        RecordPaymentRequest, UpdateInvoiceStatusRequest,
    },
    ApiResponse, AppState,
};

use super::common::Pagination;

/// Routes scoped under `/api/invoices`.
pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/:id", get(get_invoice))
        .route("/:id/payments", post(record_payment))
        .route("/:id/status", put(update_invoice_status))
        .route("/:id/pdf", get(invoice_pdf))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct InvoiceListQuery {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
}

/// List invoices
#[utoipa::path(
    get,
    path = "/api/invoices",
    params(InvoiceListQuery, Pagination),
    responses(
        (status = 200, description = "Invoices retrieved", body = ApiResponse<InvoiceListResponse>),
    ),
    security(("Bearer" = [])),
    tag = "Invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<InvoiceListResponse>>, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state
        .services
        .invoices
        .list_invoices(
            InvoiceFilter {
                status: query.status,
                customer_id: query.customer_id,
            },
            page,
            per_page,
        )
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Raise an invoice for an order
#[utoipa::path(
    post,
    path = "/api/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created", body = ApiResponse<InvoiceResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already invoiced", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InvoiceResponse>>), ServiceError> {
    tracing::info!(user_id = %user.user_id, order_id = %request.order_id, "invoice requested");
    let invoice = state.services.invoices.create_for_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(invoice))))
}

/// Fetch one invoice with its line items
#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice retrieved", body = ApiResponse<InvoiceResponse>),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InvoiceResponse>>, ServiceError> {
    let invoice = state.services.invoices.get_invoice(id).await?;
    Ok(Json(ApiResponse::success(invoice)))
}

/// Record a payment against an invoice
#[utoipa::path(
    post,
    path = "/api/invoices/{id}/payments",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<InvoiceResponse>),
        (status = 400, description = "Invalid amount", body = crate::errors::ErrorResponse),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Invoices"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<ApiResponse<InvoiceResponse>>, ServiceError> {
    tracing::info!(invoice_id = %id, user_id = %user.user_id, "payment submitted");
    let invoice = state.services.invoices.record_payment(id, request).await?;
    Ok(Json(ApiResponse::success(invoice)))
}

/// Force an invoice status transition
#[utoipa::path(
    put,
    path = "/api/invoices/{id}/status",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = UpdateInvoiceStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<InvoiceResponse>),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Invoices"
)]
pub async fn update_invoice_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateInvoiceStatusRequest>,
) -> Result<Json<ApiResponse<InvoiceResponse>>, ServiceError> {
    let invoice = state.services.invoices.update_status(id, request).await?;
    Ok(Json(ApiResponse::success(invoice)))
}

/// Render (or re-render) the invoice PDF and return its retrieval URL
#[utoipa::path(
    get,
    path = "/api/invoices/{id}/pdf",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "PDF rendered", body = ApiResponse<InvoicePdfResponse>),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Rendering or storage failed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Invoices"
)]
pub async fn invoice_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InvoicePdfResponse>>, ServiceError> {
    let pdf = state.services.invoice_pdf.generate(id).await?;
    Ok(Json(ApiResponse::success(pdf)))
}
