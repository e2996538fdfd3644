use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    errors::ServiceError,
    services::analytics::{resolve_range, AnalyticsReport},
    ApiResponse, AppState,
};

/// Routes scoped under `/api/analytics`.
///
/// The range is accepted both as query parameters (GET) and as a JSON body
/// (POST); either a preset token or explicit dates. Invalid input silently
/// falls back to a trailing 30-day window.
pub fn analytics_routes() -> Router<AppState> {
    Router::new().route("/", get(get_analytics).post(post_analytics))
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct RangeParams {
    /// One of `last_7`, `last_30`, `last_90`, `ytd`; anything else falls
    /// back to `from`/`to`.
    pub preset: Option<String>,
    /// Window start, `YYYY-MM-DD`
    pub from: Option<String>,
    /// Window end, `YYYY-MM-DD`
    pub to: Option<String>,
}

async fn run_report(
    state: &AppState,
    params: RangeParams,
) -> Result<Json<ApiResponse<AnalyticsReport>>, ServiceError> {
    let range = resolve_range(
        params.preset.as_deref(),
        params.from.as_deref(),
        params.to.as_deref(),
        Utc::now(),
    );
    let report = state.services.analytics.report(range).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Analytics report for a date window (query parameters)
#[utoipa::path(
    get,
    path = "/api/analytics",
    params(RangeParams),
    responses(
        (status = 200, description = "Report computed", body = ApiResponse<AnalyticsReport>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Analytics"
)]
pub async fn get_analytics(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<ApiResponse<AnalyticsReport>>, ServiceError> {
    run_report(&state, params).await
}

/// Analytics report for a date window (JSON body)
#[utoipa::path(
    post,
    path = "/api/analytics",
    request_body = RangeParams,
    responses(
        (status = 200, description = "Report computed", body = ApiResponse<AnalyticsReport>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Analytics"
)]
pub async fn post_analytics(
    State(state): State<AppState>,
    Json(params): Json<RangeParams>,
) -> Result<Json<ApiResponse<AnalyticsReport>>, ServiceError> {
    run_report(&state, params).await
}
