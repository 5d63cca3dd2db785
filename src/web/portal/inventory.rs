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
    domain::{format_cents, parse_amount_cents, InventoryValuation, RestockRequest},
    error::{AppError, Result},
    web::templates::{error_page, Flash, FlashQuery, HtmlTemplate},
};
use super::{redirect_error, redirect_notice};

#[derive(Template)]
#[template(path = "inventory.html")]
pub struct InventoryTemplate {
    pub flash: Flash,
    pub items: Vec<ItemRow>,
    pub total_cost: String,
    pub total_value: String,
    pub potential_profit: String,
}

pub struct ItemRow {
    pub id: String,
    pub name: String,
    pub unit_cost: String,
    pub unit_price: String,
    pub unit_profit: String,
    pub stock: i64,
    pub value: String,
}

pub async fn inventory_page(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match build_page(&state, flash.into()).await {
        Ok(template) => HtmlTemplate(template).into_response(),
        Err(e) => error_page(e),
    }
}

async fn build_page(state: &AppState, flash: Flash) -> Result<InventoryTemplate> {
    let items = state.service_context.inventory_service.list().await?;
    let valuation = InventoryValuation::of(&items)?;

    let rows = items
        .iter()
        .map(|i| {
            Ok(ItemRow {
                id: i.id.to_string(),
                name: i.name.clone(),
                unit_cost: format_cents(i.unit_cost_cents),
                unit_price: format_cents(i.unit_price_cents),
                unit_profit: format_cents(i.unit_profit_cents()),
                stock: i.stock,
                value: format_cents(i.stock_value_cents()?),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(InventoryTemplate {
        flash,
        items: rows,
        total_cost: format_cents(valuation.cost_cents),
        total_value: format_cents(valuation.sale_cents),
        potential_profit: format_cents(valuation.potential_profit_cents),
    })
}

fn parse_quantity(input: &str) -> Result<i64> {
    input
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid quantity: {}", input.trim())))
}

#[derive(Debug, Deserialize)]
pub struct RestockForm {
    pub name: String,
    /// Blank means zero.
    #[serde(default)]
    pub unit_cost: String,
    pub unit_price: String,
    pub quantity: String,
}

impl RestockForm {
    fn to_request(&self) -> Result<RestockRequest> {
        let unit_cost_cents = if self.unit_cost.trim().is_empty() {
            0
        } else {
            parse_amount_cents(&self.unit_cost)?
        };

        Ok(RestockRequest {
            name: self.name.clone(),
            unit_cost_cents,
            unit_price_cents: parse_amount_cents(&self.unit_price)?,
            quantity: parse_quantity(&self.quantity)?,
        })
    }
}

pub async fn restock(State(state): State<AppState>, Form(form): Form<RestockForm>) -> Response {
    let result = match form.to_request() {
        Ok(request) => state.service_context.inventory_service.restock(request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(item) => redirect_notice(
            "/inventory",
            &format!("{} now has {} in stock", item.name, item.stock),
        ),
        Err(e) => redirect_error("/inventory", &e.user_message()),
    }
}

#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: String,
}

/// Overwrites the stock count.
pub async fn set_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<QuantityForm>,
) -> Response {
    let inventory = &state.service_context.inventory_service;
    let result = match parse_quantity(&form.quantity) {
        Ok(stock) => inventory.set_stock(id, stock).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(item) => redirect_notice("/inventory", &format!("{} stock set to {}", item.name, item.stock)),
        Err(e) => redirect_error("/inventory", &e.user_message()),
    }
}

pub async fn sell_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<QuantityForm>,
) -> Response {
    let inventory = &state.service_context.inventory_service;
    let result = match parse_quantity(&form.quantity) {
        Ok(quantity) => inventory.sell(id, quantity).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(item) => redirect_notice("/inventory", &format!("Sold. {} has {} left", item.name, item.stock)),
        Err(e) => redirect_error("/inventory", &e.user_message()),
    }
}

pub async fn delete_item(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.service_context.inventory_service.delete(id).await {
        Ok(()) => redirect_notice("/inventory", "Item deleted"),
        Err(e) => redirect_error("/inventory", &e.user_message()),
    }
}
