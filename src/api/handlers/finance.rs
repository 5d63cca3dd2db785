use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::{
    api::state::AppState,
    domain::{months_to_date, FinanceSummary},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct FinanceParams {
    year: Option<i32>,
    month: Option<u32>,
}

/// Income, expenses and balance per month. Defaults to the current year up
/// to the current month.
pub async fn summary(
    State(state): State<AppState>,
    Query(params): Query<FinanceParams>,
) -> Result<Json<FinanceSummary>> {
    let today = Utc::now().date_naive();
    let year = params.year.unwrap_or(today.year());
    let month = params.month.unwrap_or_else(|| months_to_date(year, today));

    let summary = state.service_context.finance_service.summary(year, month).await?;
    Ok(Json(summary))
}
