use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::Result;
use super::{checked_total, validate_period, Expense, ExpenseCategory, Payment};

/// Months of `year` that have started by `today`: the current month for the
/// current year, all twelve otherwise.
pub fn months_to_date(year: i32, today: NaiveDate) -> u32 {
    if year == today.year() {
        today.month()
    } else {
        12
    }
}

/// One month of the year's books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyBalance {
    pub month: u32,
    pub income_cents: i64,
    pub expense_cents: i64,
    pub balance_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total_cents: i64,
}

/// Income against expenses for months `1..=through_month` of a year.
///
/// Income is counted in the month the dues cover, not the day they were
/// paid. Expenses are counted in the month they were spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinanceSummary {
    pub year: i32,
    pub through_month: u32,
    pub months: Vec<MonthlyBalance>,
    pub income_cents: i64,
    pub expense_cents: i64,
    pub balance_cents: i64,
    /// Categories with spending, largest first.
    pub by_category: Vec<CategoryTotal>,
}

impl FinanceSummary {
    pub fn build(
        year: i32,
        through_month: u32,
        payments: &[Payment],
        expenses: &[Expense],
    ) -> Result<Self> {
        validate_period(through_month, year)?;

        let payments: Vec<&Payment> = payments
            .iter()
            .filter(|p| p.year == year && p.month <= through_month)
            .collect();
        let expenses: Vec<&Expense> = expenses
            .iter()
            .filter(|e| e.spent_on.year() == year && e.spent_on.month() <= through_month)
            .collect();

        let mut months = Vec::with_capacity(through_month as usize);
        for month in 1..=through_month {
            let income_cents = checked_total(
                payments.iter().filter(|p| p.month == month).map(|p| p.amount_cents),
            )?;
            let expense_cents = checked_total(
                expenses
                    .iter()
                    .filter(|e| e.spent_on.month() == month)
                    .map(|e| e.amount_cents),
            )?;
            months.push(MonthlyBalance {
                month,
                income_cents,
                expense_cents,
                balance_cents: checked_total([income_cents, -expense_cents])?,
            });
        }

        let mut by_category = Vec::new();
        for category in ExpenseCategory::ALL {
            let total_cents = checked_total(
                expenses
                    .iter()
                    .filter(|e| e.category == category)
                    .map(|e| e.amount_cents),
            )?;
            if total_cents > 0 {
                by_category.push(CategoryTotal { category, total_cents });
            }
        }
        by_category.sort_by(|a, b| b.total_cents.cmp(&a.total_cents));

        let income_cents = checked_total(months.iter().map(|m| m.income_cents))?;
        let expense_cents = checked_total(months.iter().map(|m| m.expense_cents))?;

        Ok(Self {
            year,
            through_month,
            months,
            income_cents,
            expense_cents,
            balance_cents: checked_total([income_cents, -expense_cents])?,
            by_category,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::error::AppError;

    fn payment(month: u32, year: i32, amount_cents: i64) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            member_id: "12345678".to_string(),
            month,
            year,
            amount_cents,
            payment_date: NaiveDate::from_ymd_opt(year, month, 10).unwrap(),
            dues_plan_snapshot: "Open - $2000".to_string(),
            created_at: Utc::now(),
        }
    }

    fn expense(year: i32, month: u32, amount_cents: i64, category: ExpenseCategory) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            concept: category.as_str().to_string(),
            amount_cents,
            spent_on: NaiveDate::from_ymd_opt(year, month, 3).unwrap(),
            category,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_monthly_rows_and_totals() {
        let payments = vec![
            payment(1, 2025, 200_000),
            payment(1, 2025, 80_000),
            payment(3, 2025, 200_000),
            payment(4, 2025, 200_000),
            payment(1, 2024, 999_999),
        ];
        let expenses = vec![
            expense(2025, 1, 100_000, ExpenseCategory::Utilities),
            expense(2025, 2, 250_000, ExpenseCategory::Rent),
            expense(2025, 3, 50_000, ExpenseCategory::Utilities),
            expense(2025, 5, 10_000, ExpenseCategory::Other),
        ];

        let summary = FinanceSummary::build(2025, 3, &payments, &expenses).unwrap();

        assert_eq!(summary.months.len(), 3);
        assert_eq!(summary.months[0].income_cents, 280_000);
        assert_eq!(summary.months[0].balance_cents, 180_000);
        assert_eq!(summary.months[1].balance_cents, -250_000);
        assert_eq!(summary.months[2].balance_cents, 150_000);
        assert_eq!(summary.income_cents, 480_000);
        assert_eq!(summary.expense_cents, 400_000);
        assert_eq!(summary.balance_cents, 80_000);
        assert_eq!(
            summary.by_category,
            vec![
                CategoryTotal { category: ExpenseCategory::Rent, total_cents: 250_000 },
                CategoryTotal { category: ExpenseCategory::Utilities, total_cents: 150_000 },
            ]
        );
    }

    #[test]
    fn test_months_to_date() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 18).unwrap();
        assert_eq!(months_to_date(2025, today), 4);
        assert_eq!(months_to_date(2024, today), 12);
    }

    #[test]
    fn test_empty_year() {
        let summary = FinanceSummary::build(2025, 12, &[], &[]).unwrap();
        assert_eq!(summary.months.len(), 12);
        assert_eq!(summary.balance_cents, 0);
        assert!(summary.by_category.is_empty());
    }

    #[test]
    fn test_invalid_period_and_overflow() {
        assert!(matches!(FinanceSummary::build(2025, 13, &[], &[]), Err(AppError::Validation(_))));

        let payments = vec![payment(1, 2025, i64::MAX), payment(1, 2025, 1)];
        assert!(matches!(
            FinanceSummary::build(2025, 1, &payments, &[]),
            Err(AppError::Validation(_))
        ));
    }
}
