use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HydroPak API",
        version = "0.3.0",
        description = r#"
# HydroPak Back-Office API

REST API for a water-delivery business: customers, products and stock,
orders, invoicing with PDF export, deliveries, drivers and reporting.

## Authentication

All `/api` endpoints except `/api/auth/login` require a bearer token:

```
Authorization: Bearer <your-jwt-token>
```

In development the `HYDROPAK__AUTH_DISABLED=true` flag bypasses the check.

## Error Handling

Errors share one response shape with appropriate HTTP status codes:

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "details": ["name: Name is required"],
  "timestamp": "2026-01-01T00:00:00Z"
}
```
"#,
        contact(name = "HydroPak Engineering", email = "dev@hydropak.io"),
    ),
    paths(
        crate::auth::login_handler,
        crate::handlers::customers::list_customers,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::deactivate_customer,
        crate::handlers::products::list_products,
        crate::handlers::products::low_stock,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::restock_product,
        crate::handlers::products::product_movements,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::cancel_order,
        crate::handlers::invoices::list_invoices,
        crate::handlers::invoices::create_invoice,
        crate::handlers::invoices::get_invoice,
        crate::handlers::invoices::record_payment,
        crate::handlers::invoices::update_invoice_status,
        crate::handlers::invoices::invoice_pdf,
        crate::handlers::deliveries::list_deliveries,
        crate::handlers::deliveries::create_delivery,
        crate::handlers::deliveries::get_delivery,
        crate::handlers::deliveries::update_delivery_status,
        crate::handlers::deliveries::assign_driver,
        crate::handlers::drivers::list_drivers,
        crate::handlers::drivers::create_driver,
        crate::handlers::drivers::get_driver,
        crate::handlers::drivers::update_driver,
        crate::handlers::dashboard::get_dashboard_metrics,
        crate::handlers::analytics::get_analytics,
        crate::handlers::analytics::post_analytics,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,

            // Auth types
            crate::auth::LoginRequest,
            crate::auth::TokenResponse,
            crate::auth::UserInfo,

            // Customer types
            crate::services::customers::CreateCustomerRequest,
            crate::services::customers::UpdateCustomerRequest,
            crate::services::customers::CustomerResponse,
            crate::entities::customer::CustomerStatus,

            // Product types
            crate::services::products::CreateProductRequest,
            crate::services::products::UpdateProductRequest,
            crate::services::products::RestockRequest,
            crate::services::products::ProductResponse,
            crate::services::products::MovementResponse,
            crate::entities::inventory_movement::MovementReason,

            // Order types
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::CreateOrderItem,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,
            crate::entities::order::OrderStatus,

            // Invoice types
            crate::services::invoices::CreateInvoiceRequest,
            crate::services::invoices::RecordPaymentRequest,
            crate::services::invoices::UpdateInvoiceStatusRequest,
            crate::services::invoices::InvoiceResponse,
            crate::services::invoices::InvoiceItemResponse,
            crate::services::invoice_pdf::InvoicePdfResponse,
            crate::entities::invoice::InvoiceStatus,

            // Delivery types
            crate::services::deliveries::CreateDeliveryRequest,
            crate::services::deliveries::UpdateDeliveryStatusRequest,
            crate::services::deliveries::AssignDriverRequest,
            crate::services::deliveries::DeliveryResponse,
            crate::entities::delivery::DeliveryStatus,

            // Driver types
            crate::services::drivers::CreateDriverRequest,
            crate::services::drivers::UpdateDriverRequest,
            crate::services::drivers::DriverResponse,

            // List envelopes
            crate::services::customers::CustomerListResponse,
            crate::services::products::ProductListResponse,
            crate::services::orders::OrderListResponse,
            crate::services::invoices::InvoiceListResponse,
            crate::services::deliveries::DeliveryListResponse,

            // Reporting types
            crate::handlers::analytics::RangeParams,
            crate::services::analytics::AnalyticsReport,
            crate::services::analytics::Kpis,
            crate::services::analytics::Growth,
            crate::services::analytics::TimeseriesPoint,
            crate::services::analytics::TopProduct,
            crate::services::analytics::TopCustomer,
            crate::services::analytics::ChannelSlice,
            crate::services::analytics::StatusCount,
            crate::services::analytics::DashboardMetrics,
            crate::services::analytics::SalesOverview,
            crate::services::analytics::InventoryOverview,
            crate::services::analytics::DeliveryOverview,
            crate::services::analytics::ReceivablesOverview,
        )
    ),
    tags(
        (name = "Auth", description = "Authentication"),
        (name = "Customers", description = "Customer records"),
        (name = "Products", description = "Product catalog and stock"),
        (name = "Orders", description = "Order lifecycle"),
        (name = "Invoices", description = "Invoicing and PDF export"),
        (name = "Deliveries", description = "Delivery scheduling"),
        (name = "Drivers", description = "Driver roster"),
        (name = "Dashboard", description = "Headline metrics"),
        (name = "Analytics", description = "Windowed reporting"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
