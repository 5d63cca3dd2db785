use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    domain::{validate_period, FinanceSummary},
    error::{AppError, Result},
    repository::{ExpenseRepository, PaymentRepository},
};

/// Read-only view over dues income and expenses.
pub struct FinanceService {
    payment_repo: Arc<dyn PaymentRepository>,
    expense_repo: Arc<dyn ExpenseRepository>,
}

impl FinanceService {
    pub fn new(
        payment_repo: Arc<dyn PaymentRepository>,
        expense_repo: Arc<dyn ExpenseRepository>,
    ) -> Self {
        Self { payment_repo, expense_repo }
    }

    pub async fn summary(&self, year: i32, through_month: u32) -> Result<FinanceSummary> {
        validate_period(through_month, year)?;

        let invalid = || AppError::Validation(format!("Invalid year: {}", year));
        let from = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
        let to = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?;

        let payments = self.payment_repo.list_for_year(year).await?;
        let expenses = self.expense_repo.list_between(from, to).await?;

        let summary = FinanceSummary::build(year, through_month, &payments, &expenses)?;
        tracing::debug!(
            year,
            through_month,
            income_cents = summary.income_cents,
            expense_cents = summary.expense_cents,
            "Finance summary built"
        );
        Ok(summary)
    }
}
