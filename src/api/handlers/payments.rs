use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    api::state::AppState,
    domain::{Payment, RegisterPaymentRequest},
    error::{AppError, Result},
};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterPaymentRequest>,
) -> Result<(StatusCode, Json<Payment>)> {
    let payment = state.service_context.ledger.register_payment(request).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn get(
    State(state): State<AppState>,
    Path((member_id, year, month)): Path<(String, i32, u32)>,
) -> Result<Json<Payment>> {
    let payment = state
        .service_context
        .ledger
        .find_payment(&member_id, month, year)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No payment for {} in {}/{}", member_id, month, year))
        })?;

    Ok(Json(payment))
}

#[derive(Debug, Deserialize)]
pub struct PendingParams {
    year: Option<i32>,
    month: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PendingMemberDto {
    member_id: String,
    name: String,
    dues_plan: String,
    missing_months: Vec<u32>,
    monthly_fee_cents: i64,
    total_due_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    year: i32,
    as_of_month: u32,
    members: Vec<PendingMemberDto>,
    grand_total_cents: i64,
}

/// Defaults to the current year up to the current month.
pub async fn pending(
    State(state): State<AppState>,
    Query(params): Query<PendingParams>,
) -> Result<Json<PendingResponse>> {
    let today = Utc::now().date_naive();
    let year = params.year.unwrap_or(today.year());
    let month = params.month.unwrap_or(today.month());

    let report = state.service_context.ledger.list_pending_payments(year, month).await?;

    let grand_total_cents = report.grand_total_cents()?;
    let members: Vec<PendingMemberDto> = report
        .entries()?
        .into_iter()
        .map(|p| PendingMemberDto {
            member_id: p.member.id,
            name: p.member.name,
            dues_plan: p.member.dues_plan,
            missing_months: p.missing_months,
            monthly_fee_cents: p.monthly_fee_cents,
            total_due_cents: p.total_due_cents,
        })
        .collect();

    Ok(Json(PendingResponse {
        year: report.year,
        as_of_month: report.as_of_month,
        members,
        grand_total_cents,
    }))
}
