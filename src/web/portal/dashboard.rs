use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::{Datelike, Utc};

use crate::{
    api::state::AppState,
    domain::{format_cents, InventoryValuation},
    error::Result,
    web::templates::{error_page, Flash, FlashQuery, HtmlTemplate},
};
use super::format_date;

const RECENT_PAYMENTS: i64 = 10;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub flash: Flash,
    pub year: i32,
    pub member_count: i64,
    pub inventory_count: usize,
    pub stock_value: String,
    pub expenses_total: String,
    pub income: String,
    pub balance: String,
    pub in_deficit: bool,
    pub pending_total: String,
    pub pending_members: usize,
    pub recent_payments: Vec<RecentPaymentRow>,
}

pub struct RecentPaymentRow {
    pub member_id: String,
    pub period: String,
    pub amount: String,
    pub payment_date: String,
}

pub async fn dashboard_page(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match build_dashboard(&state, flash.into()).await {
        Ok(template) => HtmlTemplate(template).into_response(),
        Err(e) => error_page(e),
    }
}

async fn build_dashboard(state: &AppState, flash: Flash) -> Result<DashboardTemplate> {
    let ctx = &state.service_context;
    let today = Utc::now().date_naive();
    let year = today.year();

    let items = ctx.inventory_service.list().await?;
    let valuation = InventoryValuation::of(&items)?;
    let pending = ctx.ledger.list_pending_payments(year, today.month()).await?;
    let finance = ctx.finance_service.summary(year, 12).await?;
    let recent = ctx.ledger.recent_payments(RECENT_PAYMENTS).await?;

    Ok(DashboardTemplate {
        flash,
        year,
        member_count: ctx.ledger.member_count().await?,
        inventory_count: items.len(),
        stock_value: format_cents(valuation.sale_cents),
        expenses_total: format_cents(ctx.expense_service.total().await?),
        income: format_cents(ctx.ledger.income_for_year(year).await?),
        balance: format_cents(finance.balance_cents),
        in_deficit: finance.balance_cents < 0,
        pending_total: format_cents(pending.grand_total_cents()?),
        pending_members: pending.iter().count(),
        recent_payments: recent
            .iter()
            .map(|p| RecentPaymentRow {
                member_id: p.member_id.clone(),
                period: p.period_label(),
                amount: format_cents(p.amount_cents),
                payment_date: format_date(p.payment_date),
            })
            .collect(),
    })
}
