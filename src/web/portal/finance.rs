use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::{
    api::state::AppState,
    domain::{format_cents, month_name, months_to_date},
    web::templates::{error_page, Flash, FlashQuery, HtmlTemplate},
};
use super::{month_options, MonthOption};

#[derive(Template)]
#[template(path = "finance.html")]
pub struct FinanceTemplate {
    pub flash: Flash,
    pub year: i32,
    pub month_name: String,
    pub months: Vec<MonthOption>,
    pub rows: Vec<MonthRow>,
    pub categories: Vec<CategoryRow>,
    pub income: String,
    pub expenses: String,
    pub balance: String,
    pub in_deficit: bool,
}

pub struct MonthRow {
    pub name: &'static str,
    pub income: String,
    pub expenses: String,
    pub balance: String,
    pub in_deficit: bool,
}

pub struct CategoryRow {
    pub name: &'static str,
    pub total: String,
}

#[derive(Debug, Deserialize)]
pub struct FinanceQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn finance_page(
    State(state): State<AppState>,
    Query(query): Query<FinanceQuery>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or_else(|| months_to_date(year, today));

    let summary = match state.service_context.finance_service.summary(year, month).await {
        Ok(summary) => summary,
        Err(e) => return error_page(e),
    };

    HtmlTemplate(FinanceTemplate {
        flash: flash.into(),
        year: summary.year,
        month_name: month_name(summary.through_month).to_string(),
        months: month_options(summary.through_month),
        rows: summary
            .months
            .iter()
            .map(|m| MonthRow {
                name: month_name(m.month),
                income: format_cents(m.income_cents),
                expenses: format_cents(m.expense_cents),
                balance: format_cents(m.balance_cents),
                in_deficit: m.balance_cents < 0,
            })
            .collect(),
        categories: summary
            .by_category
            .iter()
            .map(|c| CategoryRow {
                name: c.category.as_str(),
                total: format_cents(c.total_cents),
            })
            .collect(),
        income: format_cents(summary.income_cents),
        expenses: format_cents(summary.expense_cents),
        balance: format_cents(summary.balance_cents),
        in_deficit: summary.balance_cents < 0,
    })
    .into_response()
}
