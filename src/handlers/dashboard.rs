use axum::{extract::State, response::Json, routing::get, Router};

use crate::{
    errors::ServiceError, services::analytics::DashboardMetrics, ApiResponse, AppState,
};

/// Routes scoped under `/api/dashboard`.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(get_dashboard_metrics))
}

/// Headline metrics for the dashboard landing page
#[utoipa::path(
    get,
    path = "/api/dashboard/metrics",
    responses(
        (status = 200, description = "Metrics computed", body = ApiResponse<DashboardMetrics>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Dashboard"
)]
pub async fn get_dashboard_metrics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardMetrics>>, ServiceError> {
    let metrics = state.services.analytics.dashboard_metrics().await?;
    Ok(Json(ApiResponse::success(metrics)))
}
