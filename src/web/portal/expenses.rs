use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{
        cents_to_input, checked_total, format_cents, parse_amount_cents, ExpenseCategory,
        ExpenseFilter, ExpenseSort, RecordExpenseRequest,
    },
    error::{AppError, Result},
    web::templates::{error_page, Flash, FlashQuery, HtmlTemplate},
};
use super::{format_date, parse_optional_date, redirect_error, redirect_notice};

#[derive(Template)]
#[template(path = "expenses.html")]
pub struct ExpensesTemplate {
    pub flash: Flash,
    pub expenses: Vec<ExpenseRow>,
    pub total: String,
    pub categories: Vec<&'static str>,
    pub filters: Vec<SelectOption>,
    pub sorts: Vec<SelectOption>,
    pub filtered: bool,
    pub today: String,
}

#[derive(Template)]
#[template(path = "expense_form.html")]
pub struct ExpenseFormTemplate {
    pub flash: Flash,
    pub id: String,
    pub concept: String,
    pub amount: String,
    pub spent_on: String,
    pub description: String,
    pub categories: Vec<SelectOption>,
}

pub struct ExpenseRow {
    pub id: String,
    pub concept: String,
    pub amount: String,
    pub spent_on: String,
    pub category: &'static str,
    pub description: String,
}

pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn category_options(selected: Option<ExpenseCategory>) -> Vec<SelectOption> {
    ExpenseCategory::ALL
        .iter()
        .map(|c| SelectOption {
            value: c.as_str(),
            label: c.as_str(),
            selected: Some(*c) == selected,
        })
        .collect()
}

/// `?category=Rent&sort=largest`. Blank or unknown values mean "all" and
/// "newest".
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseQuery {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sort: String,
}

impl ExpenseQuery {
    fn to_filter(&self) -> ExpenseFilter {
        ExpenseFilter {
            category: ExpenseCategory::from_str(&self.category),
            sort: ExpenseSort::from_str(&self.sort).unwrap_or_default(),
            ..Default::default()
        }
    }
}

pub async fn expenses_page(
    State(state): State<AppState>,
    Query(query): Query<ExpenseQuery>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    let filter = query.to_filter();
    let expenses = match state.service_context.expense_service.search(&filter).await {
        Ok(expenses) => expenses,
        Err(e) => return error_page(e),
    };
    let total = match checked_total(expenses.iter().map(|e| e.amount_cents)) {
        Ok(total) => total,
        Err(e) => return error_page(e),
    };

    HtmlTemplate(ExpensesTemplate {
        flash: flash.into(),
        total: format_cents(total),
        expenses: expenses
            .iter()
            .map(|e| ExpenseRow {
                id: e.id.to_string(),
                concept: e.concept.clone(),
                amount: format_cents(e.amount_cents),
                spent_on: format_date(e.spent_on),
                category: e.category.as_str(),
                description: e.description.clone().unwrap_or_default(),
            })
            .collect(),
        categories: ExpenseCategory::ALL.iter().map(|c| c.as_str()).collect(),
        filters: category_options(filter.category),
        sorts: ExpenseSort::ALL
            .iter()
            .map(|s| SelectOption {
                value: s.as_str(),
                label: s.label(),
                selected: *s == filter.sort,
            })
            .collect(),
        filtered: filter.category.is_some(),
        today: Utc::now().date_naive().format("%Y-%m-%d").to_string(),
    })
    .into_response()
}

pub async fn edit_expense_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match state.service_context.expense_service.get(id).await {
        Ok(expense) => HtmlTemplate(ExpenseFormTemplate {
            flash: flash.into(),
            id: expense.id.to_string(),
            concept: expense.concept,
            amount: cents_to_input(expense.amount_cents),
            spent_on: expense.spent_on.format("%Y-%m-%d").to_string(),
            description: expense.description.unwrap_or_default(),
            categories: category_options(Some(expense.category)),
        })
        .into_response(),
        Err(e) => error_page(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    pub concept: String,
    pub amount: String,
    #[serde(default)]
    pub spent_on: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
}

impl ExpenseForm {
    fn to_request(&self) -> Result<RecordExpenseRequest> {
        let category = ExpenseCategory::from_str(&self.category)
            .ok_or_else(|| AppError::Validation(format!("Unknown category: {}", self.category)))?;

        Ok(RecordExpenseRequest {
            concept: self.concept.clone(),
            amount_cents: parse_amount_cents(&self.amount)?,
            spent_on: parse_optional_date(&self.spent_on, "date")?
                .unwrap_or_else(|| Utc::now().date_naive()),
            category,
            description: Some(self.description.clone()),
        })
    }
}

pub async fn record_expense(State(state): State<AppState>, Form(form): Form<ExpenseForm>) -> Response {
    let result = match form.to_request() {
        Ok(request) => state.service_context.expense_service.record(request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(expense) => redirect_notice(
            "/expenses",
            &format!("Recorded {} ({})", expense.concept, format_cents(expense.amount_cents)),
        ),
        Err(e) => redirect_error("/expenses", &e.user_message()),
    }
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let result = match form.to_request() {
        Ok(request) => state.service_context.expense_service.update(id, request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(expense) => redirect_notice("/expenses", &format!("Updated {}", expense.concept)),
        Err(AppError::NotFound(msg)) => error_page(AppError::NotFound(msg)),
        Err(e) => redirect_error(&format!("/expenses/{}/edit", id), &e.user_message()),
    }
}

pub async fn delete_expense(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.service_context.expense_service.delete(id).await {
        Ok(()) => redirect_notice("/expenses", "Expense deleted"),
        Err(e) => redirect_error("/expenses", &e.user_message()),
    }
}
