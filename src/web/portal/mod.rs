mod dashboard;
mod expenses;
mod finance;
mod inventory;
mod members;
mod payments;
mod plans;

use axum::{
    Router,
    http::HeaderValue,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::NaiveDate;

use crate::{
    api::state::AppState,
    domain::MONTH_NAMES,
    error::{AppError, Result},
};

pub fn create_portal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/dashboard", get(dashboard::dashboard_page))

        // Members
        .route("/members", get(members::members_page))
        .route("/members/new", get(members::new_member_page).post(members::create_member))
        .route("/members/export.csv", get(members::export_members))
        .route("/members/import", post(members::import_members))
        .route("/members/:id", get(members::member_detail_page))
        .route("/members/:id/edit", get(members::edit_member_page).post(members::update_member))
        .route("/members/:id/delete", post(members::delete_member))

        // Payments
        .route("/payments", get(payments::payments_page).post(payments::register_payment))
        .route("/payments/pending", get(payments::pending_page))

        // Inventory and expenses
        .route("/inventory", get(inventory::inventory_page).post(inventory::restock))
        .route("/inventory/:id/stock", post(inventory::set_stock))
        .route("/inventory/:id/sell", post(inventory::sell_item))
        .route("/inventory/:id/delete", post(inventory::delete_item))
        .route("/expenses", get(expenses::expenses_page).post(expenses::record_expense))
        .route("/expenses/:id/edit", get(expenses::edit_expense_page).post(expenses::update_expense))
        .route("/expenses/:id/delete", post(expenses::delete_expense))
        .route("/finance", get(finance::finance_page))

        // Dues plans
        .route("/plans", get(plans::plans_page).post(plans::create_plan))
        .route("/plans/:id", post(plans::update_plan))
        .route("/plans/:id/delete", post(plans::delete_plan))
}

/// Redirects to `path` with a success message in the query string.
pub fn redirect_notice(path: &str, message: &str) -> Response {
    redirect_with(path, "notice", message)
}

pub fn redirect_error(path: &str, message: &str) -> Response {
    redirect_with(path, "error", message)
}

fn redirect_with(path: &str, key: &str, message: &str) -> Response {
    let separator = if path.contains('?') { '&' } else { '?' };
    let location = format!("{}{}{}={}", path, separator, key, urlencoding::encode(message));

    // Redirect::to panics on locations that are not valid header values
    if HeaderValue::from_str(&location).is_err() {
        tracing::warn!(location = %location.escape_debug(), "Refusing invalid redirect target");
        return Redirect::to("/dashboard").into_response();
    }
    Redirect::to(&location).into_response()
}

/// Path of a member page, with the ID percent-encoded.
pub fn member_path(id: &str) -> String {
    format!("/members/{}", urlencoding::encode(id))
}

/// Blank means "not given".
pub fn parse_optional_date(input: &str, field: &str) -> Result<Option<NaiveDate>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| AppError::Validation(format!("Invalid {}: {}", field, input)))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub struct MonthOption {
    pub value: u32,
    pub name: &'static str,
    pub selected: bool,
}

pub fn month_options(selected: u32) -> Vec<MonthOption> {
    MONTH_NAMES
        .iter()
        .copied()
        .zip(1u32..)
        .map(|(name, value)| MonthOption {
            value,
            name,
            selected: value == selected,
        })
        .collect()
}

/// Only same-site absolute paths are followed after a form post. Browsers
/// read `/\host` like `//host`, so a backslash never passes.
pub fn safe_return_path(candidate: Option<&str>, fallback: String) -> String {
    match candidate.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && path.chars().all(|c| c.is_ascii_graphic() && c != '\\') =>
        {
            path.to_string()
        }
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_encodes_message() {
        let response = redirect_notice("/payments?year=2025", "Paid: January & February");
        let location = response.headers().get("location").unwrap().to_str().unwrap();
        assert_eq!(location, "/payments?year=2025&notice=Paid%3A%20January%20%26%20February");
    }

    #[test]
    fn test_parse_optional_date() {
        assert_eq!(parse_optional_date("  ", "date").unwrap(), None);
        assert_eq!(
            parse_optional_date("2025-01-31", "date").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31)
        );
        assert!(parse_optional_date("31/01/2025", "date").is_err());
    }

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/members/1234567"), "/payments".into()), "/members/1234567");
        assert_eq!(safe_return_path(Some("//evil.example"), "/payments".into()), "/payments");
        assert_eq!(safe_return_path(Some("https://evil.example"), "/payments".into()), "/payments");
        assert_eq!(safe_return_path(None, "/payments".into()), "/payments");
        assert_eq!(safe_return_path(Some("/\\evil.example"), "/payments".into()), "/payments");
        assert_eq!(safe_return_path(Some("/members/1\nSet-Cookie: x"), "/payments".into()), "/payments");
        assert_eq!(safe_return_path(Some("/members/a b"), "/payments".into()), "/payments");
    }

    #[test]
    fn test_member_path_encodes_id() {
        assert_eq!(member_path("12345678"), "/members/12345678");
        assert_eq!(member_path("\n/x"), "/members/%0A%2Fx");
    }

    #[test]
    fn test_invalid_redirect_target_falls_back() {
        let response = redirect_error("/members/\n", "Not found");
        let location = response.headers().get("location").unwrap().to_str().unwrap();
        assert_eq!(location, "/dashboard");
    }

    #[test]
    fn test_month_options_mark_selection() {
        let options = month_options(3);
        assert_eq!(options.len(), 12);
        assert_eq!(options[2].name, "March");
        assert!(options[2].selected);
        assert!(!options[0].selected);
    }
}
