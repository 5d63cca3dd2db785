use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{cents_to_input, format_cents, parse_amount_cents, CreateDuesPlanRequest, UpdateDuesPlanRequest},
    error::Result,
    web::templates::{error_page, Flash, FlashQuery, HtmlTemplate},
};
use super::{redirect_error, redirect_notice};

#[derive(Template)]
#[template(path = "plans.html")]
pub struct PlansTemplate {
    pub flash: Flash,
    pub plans: Vec<PlanRow>,
    pub fallback_fee: String,
}

pub struct PlanRow {
    pub id: String,
    pub name: String,
    pub fee_input: String,
    pub fee: String,
    pub is_active: bool,
    pub member_count: i64,
}

pub async fn plans_page(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match plan_rows(&state).await {
        Ok(plans) => HtmlTemplate(PlansTemplate {
            flash: flash.into(),
            plans,
            fallback_fee: format_cents(state.settings.ledger.fallback_fee_cents),
        })
        .into_response(),
        Err(e) => error_page(e),
    }
}

async fn plan_rows(state: &AppState) -> Result<Vec<PlanRow>> {
    let service = &state.service_context.dues_plan_service;
    let mut rows = Vec::new();

    for plan in service.list(true).await? {
        rows.push(PlanRow {
            id: plan.id.to_string(),
            fee_input: cents_to_input(plan.fee_cents),
            fee: format_cents(plan.fee_cents),
            is_active: plan.is_active,
            member_count: service.member_count(&plan.name).await?,
            name: plan.name,
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
pub struct CreatePlanForm {
    pub name: String,
    pub fee: String,
}

pub async fn create_plan(State(state): State<AppState>, Form(form): Form<CreatePlanForm>) -> Response {
    let result = match parse_amount_cents(&form.fee) {
        Ok(fee_cents) => {
            state
                .service_context
                .dues_plan_service
                .create(CreateDuesPlanRequest { name: form.name, fee_cents })
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(plan) => redirect_notice("/plans", &format!("Plan {} created", plan.name)),
        Err(e) => redirect_error("/plans", &e.user_message()),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlanForm {
    pub fee: String,
    /// Checkbox: present only when ticked.
    pub is_active: Option<String>,
}

pub async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<UpdatePlanForm>,
) -> Response {
    let result = match parse_amount_cents(&form.fee) {
        Ok(fee_cents) => {
            let request = UpdateDuesPlanRequest {
                fee_cents: Some(fee_cents),
                is_active: Some(form.is_active.is_some()),
            };
            state.service_context.dues_plan_service.update(id, request).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(plan) => redirect_notice("/plans", &format!("Plan {} updated", plan.name)),
        Err(e) => redirect_error("/plans", &e.user_message()),
    }
}

pub async fn delete_plan(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.service_context.dues_plan_service.delete(id).await {
        Ok(()) => redirect_notice("/plans", "Plan deleted"),
        Err(e) => redirect_error("/plans", &e.user_message()),
    }
}
