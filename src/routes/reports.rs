//! Report endpoints. Successful responses are the report rows as a JSON array.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::{
    AppState,
    models::{DateRangeParams, ResultSet},
    services::Pagination,
};

type ReportResponse = Result<Json<ResultSet>, ApiError>;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub total: i64,
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/most-used-carriers/", get(most_used_carriers))
        .route("/carriers/count/", get(count_carriers))
        .route("/stock-hits/", get(stock_hits))
        .route("/in-transit-orders/", get(in_transit_orders))
        .route("/sales-orders/", get(sales_orders))
        .route("/product-outflow/", get(product_outflow))
        .route("/item-profitability/", get(item_profitability))
        .route("/invoices/", get(invoices))
}

/// Invoices per carrier, one column per `<month>-<year>`.
#[tracing::instrument(name = "reports.most_used_carriers", skip_all)]
pub async fn most_used_carriers(
    State(state): State<AppState>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> ReportResponse {
    let Query(pagination) = query?;
    let record = state.services.logistics.most_used_carriers(pagination).await?;
    tracing::debug!(rows = record.data.len(), "Report ready");
    Ok(Json(record.data))
}

#[tracing::instrument(name = "reports.count_carriers", skip_all)]
pub async fn count_carriers(State(state): State<AppState>) -> Result<Json<CountResponse>, ApiError> {
    let record = state.services.logistics.count_carriers().await?;
    Ok(Json(CountResponse { total: record.data }))
}

#[tracing::instrument(name = "reports.stock_hits", skip_all)]
pub async fn stock_hits(State(state): State<AppState>) -> ReportResponse {
    let record = state.services.inventory.stock_hits().await?;
    Ok(Json(record.data))
}

#[tracing::instrument(name = "reports.in_transit_orders", skip_all)]
pub async fn in_transit_orders(State(state): State<AppState>) -> ReportResponse {
    let record = state.services.inventory.in_transit_orders().await?;
    Ok(Json(record.data))
}

#[tracing::instrument(name = "reports.sales_orders", skip_all)]
pub async fn sales_orders(
    State(state): State<AppState>,
    query: Result<Query<DateRangeParams>, QueryRejection>,
) -> ReportResponse {
    let Query(range) = query?;
    let record = state.services.inventory.sales_orders(&range).await?;
    Ok(Json(record.data))
}

#[tracing::instrument(name = "reports.product_outflow", skip_all)]
pub async fn product_outflow(
    State(state): State<AppState>,
    query: Result<Query<DateRangeParams>, QueryRejection>,
) -> ReportResponse {
    let Query(range) = query?;
    let record = state.services.inventory.product_outflow(&range).await?;
    Ok(Json(record.data))
}

#[tracing::instrument(name = "reports.item_profitability", skip_all)]
pub async fn item_profitability(
    State(state): State<AppState>,
    query: Result<Query<DateRangeParams>, QueryRejection>,
) -> ReportResponse {
    let Query(range) = query?;
    let record = state.services.financial.item_profitability(&range).await?;
    Ok(Json(record.data))
}

#[tracing::instrument(name = "reports.invoices", skip_all)]
pub async fn invoices(
    State(state): State<AppState>,
    query: Result<Query<YearQuery>, QueryRejection>,
) -> ReportResponse {
    let Query(YearQuery { year }) = query?;
    let record = state.services.dashboard.invoices(year).await?;
    Ok(Json(record.data))
}
