use std::collections::HashSet;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::{
    api::state::AppState,
    domain::{
        format_cents, month_name, parse_amount_cents, validate_period, RegisterPaymentRequest,
        MONTH_NAMES,
    },
    error::{AppError, Result},
    web::templates::{error_page, Flash, FlashQuery, HtmlTemplate},
};
use super::{
    month_options, parse_optional_date, redirect_error, redirect_notice, safe_return_path,
    MonthOption,
};

#[derive(Template)]
#[template(path = "payments/grid.html")]
pub struct PaymentsTemplate {
    pub flash: Flash,
    pub year: i32,
    pub prev_year: i32,
    pub next_year: i32,
    pub month_headers: Vec<String>,
    pub rows: Vec<GridRow>,
    pub members: Vec<MemberOption>,
    pub months: Vec<MonthOption>,
    pub today: String,
    pub income: String,
}

pub struct GridRow {
    pub id: String,
    pub name: String,
    pub cells: Vec<GridCell>,
    pub paid_count: usize,
}

pub struct GridCell {
    pub paid: bool,
}

pub struct MemberOption {
    pub id: String,
    pub name: String,
}

#[derive(Template)]
#[template(path = "payments/pending.html")]
pub struct PendingTemplate {
    pub flash: Flash,
    pub year: i32,
    pub month_name: String,
    pub months: Vec<MonthOption>,
    pub rows: Vec<PendingRow>,
    pub grand_total: String,
}

pub struct PendingRow {
    pub id: String,
    pub name: String,
    pub dues_plan: String,
    pub missing: String,
    pub missing_count: usize,
    pub monthly_fee: String,
    pub total_due: String,
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn payments_page(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or(today.year());
    if let Err(e) = validate_period(1, year) {
        return error_page(e);
    }

    let ledger = &state.service_context.ledger;
    let members = match ledger.list_members().await {
        Ok(members) => members,
        Err(e) => return error_page(e),
    };
    let payments = match ledger.payments_for_year(year).await {
        Ok(payments) => payments,
        Err(e) => return error_page(e),
    };

    let paid: HashSet<(&str, u32)> = payments
        .iter()
        .map(|p| (p.member_id.as_str(), p.month))
        .collect();

    let rows = members
        .iter()
        .map(|m| {
            let cells: Vec<GridCell> = (1..=12)
                .map(|month| GridCell { paid: paid.contains(&(m.id.as_str(), month)) })
                .collect();
            GridRow {
                id: m.id.clone(),
                name: m.name.clone(),
                paid_count: cells.iter().filter(|c| c.paid).count(),
                cells,
            }
        })
        .collect();

    HtmlTemplate(PaymentsTemplate {
        flash: flash.into(),
        year,
        prev_year: year - 1,
        next_year: year + 1,
        month_headers: MONTH_NAMES.iter().map(|m| m[..3].to_string()).collect(),
        rows,
        members: members
            .iter()
            .map(|m| MemberOption { id: m.id.clone(), name: m.name.clone() })
            .collect(),
        months: month_options(today.month()),
        today: today.format("%Y-%m-%d").to_string(),
        income: format_cents(payments.iter().map(|p| p.amount_cents).sum()),
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct RegisterPaymentForm {
    pub member_id: String,
    pub month: String,
    pub year: String,
    /// Blank means the member's plan fee.
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub payment_date: String,
    pub return_to: Option<String>,
}

pub async fn register_payment(
    State(state): State<AppState>,
    Form(form): Form<RegisterPaymentForm>,
) -> Response {
    let fallback = format!("/payments?year={}", urlencoding::encode(form.year.trim()));
    let return_to = safe_return_path(form.return_to.as_deref(), fallback);

    let result = match build_request(&state, &form).await {
        Ok(request) => state.service_context.ledger.register_payment(request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(payment) => redirect_notice(
            &return_to,
            &format!(
                "Payment registered: {} for {} ({})",
                payment.member_id,
                payment.period_label(),
                format_cents(payment.amount_cents)
            ),
        ),
        Err(e) => {
            tracing::warn!(member_id = %form.member_id, error = %e, "Payment rejected");
            redirect_error(&return_to, &e.user_message())
        }
    }
}

async fn build_request(state: &AppState, form: &RegisterPaymentForm) -> Result<RegisterPaymentRequest> {
    let member_id = form.member_id.trim().to_string();
    if member_id.is_empty() {
        return Err(AppError::Validation("Choose a member".to_string()));
    }

    let month: u32 = form
        .month
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid month: {}", form.month)))?;
    let year: i32 = form
        .year
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid year: {}", form.year)))?;

    let amount_cents = if form.amount.trim().is_empty() {
        state.service_context.ledger.default_amount_for(&member_id).await?
    } else {
        parse_amount_cents(&form.amount)?
    };

    let payment_date = parse_optional_date(&form.payment_date, "payment date")?
        .unwrap_or_else(|| Utc::now().date_naive());

    Ok(RegisterPaymentRequest {
        member_id,
        month,
        year,
        amount_cents,
        payment_date,
    })
}

pub async fn pending_page(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or(today.month());

    let report = match state.service_context.ledger.list_pending_payments(year, month).await {
        Ok(report) => report,
        Err(e) => return error_page(e),
    };

    let (entries, grand_total) = match (report.entries(), report.grand_total_cents()) {
        (Ok(entries), Ok(total)) => (entries, total),
        (Err(e), _) | (_, Err(e)) => return error_page(e),
    };

    let rows: Vec<PendingRow> = entries
        .into_iter()
        .map(|p| PendingRow {
            missing: p
                .missing_months
                .iter()
                .map(|m| month_name(*m))
                .collect::<Vec<_>>()
                .join(", "),
            missing_count: p.missing_count(),
            monthly_fee: format_cents(p.monthly_fee_cents),
            total_due: format_cents(p.total_due_cents),
            id: p.member.id,
            name: p.member.name,
            dues_plan: p.member.dues_plan,
        })
        .collect();

    HtmlTemplate(PendingTemplate {
        flash: flash.into(),
        year: report.year,
        month_name: month_name(report.as_of_month).to_string(),
        months: month_options(report.as_of_month),
        rows,
        grand_total: format_cents(grand_total),
    })
    .into_response()
}
