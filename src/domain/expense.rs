use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::check_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Rent,
    Utilities,
    Supplies,
    Maintenance,
    Marketing,
    Salaries,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 7] = [
        ExpenseCategory::Rent,
        ExpenseCategory::Utilities,
        ExpenseCategory::Supplies,
        ExpenseCategory::Maintenance,
        ExpenseCategory::Marketing,
        ExpenseCategory::Salaries,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Rent => "Rent",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::Supplies => "Supplies",
            ExpenseCategory::Maintenance => "Maintenance",
            ExpenseCategory::Marketing => "Marketing",
            ExpenseCategory::Salaries => "Salaries",
            ExpenseCategory::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub concept: String,
    pub amount_cents: i64,
    pub spent_on: NaiveDate,
    pub category: ExpenseCategory,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordExpenseRequest {
    pub concept: String,
    pub amount_cents: i64,
    pub spent_on: NaiveDate,
    pub category: ExpenseCategory,
    pub description: Option<String>,
}

impl RecordExpenseRequest {
    pub fn normalized(self) -> Self {
        Self {
            concept: self.concept.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.concept.is_empty() {
            return Err(AppError::Validation("Concept is required".to_string()));
        }
        if self.amount_cents <= 0 {
            return Err(AppError::Validation(
                "Expense amount must be greater than zero".to_string(),
            ));
        }
        check_amount(self.amount_cents, "Expense amount")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseSort {
    /// Most recent date first.
    #[default]
    Newest,
    Oldest,
    Largest,
    Smallest,
    /// Grouped by category, newest first within each.
    Category,
}

impl ExpenseSort {
    pub const ALL: [ExpenseSort; 5] = [
        ExpenseSort::Newest,
        ExpenseSort::Oldest,
        ExpenseSort::Largest,
        ExpenseSort::Smallest,
        ExpenseSort::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseSort::Newest => "newest",
            ExpenseSort::Oldest => "oldest",
            ExpenseSort::Largest => "largest",
            ExpenseSort::Smallest => "smallest",
            ExpenseSort::Category => "category",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExpenseSort::Newest => "Newest first",
            ExpenseSort::Oldest => "Oldest first",
            ExpenseSort::Largest => "Largest first",
            ExpenseSort::Smallest => "Smallest first",
            ExpenseSort::Category => "By category",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sort| sort.as_str() == s.trim())
    }
}

/// Which expenses to show, and in what order. Date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub category: Option<ExpenseCategory>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sort: ExpenseSort,
}

impl ExpenseFilter {
    pub fn apply(&self, expenses: Vec<Expense>) -> Vec<Expense> {
        let mut selected: Vec<Expense> = expenses
            .into_iter()
            .filter(|e| self.category.map_or(true, |c| e.category == c))
            .filter(|e| self.from.map_or(true, |from| e.spent_on >= from))
            .filter(|e| self.to.map_or(true, |to| e.spent_on <= to))
            .collect();

        let newest = |a: &Expense, b: &Expense| {
            b.spent_on.cmp(&a.spent_on).then(b.created_at.cmp(&a.created_at))
        };
        match self.sort {
            ExpenseSort::Newest => selected.sort_by(newest),
            ExpenseSort::Oldest => selected.sort_by(|a, b| newest(b, a)),
            ExpenseSort::Largest => {
                selected.sort_by(|a, b| b.amount_cents.cmp(&a.amount_cents).then(newest(a, b)))
            }
            ExpenseSort::Smallest => {
                selected.sort_by(|a, b| a.amount_cents.cmp(&b.amount_cents).then(newest(a, b)))
            }
            ExpenseSort::Category => selected.sort_by(|a, b| {
                a.category.as_str().cmp(b.category.as_str()).then(newest(a, b))
            }),
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_names() {
        assert_eq!(ExpenseCategory::from_str("rent"), Some(ExpenseCategory::Rent));
        assert_eq!(ExpenseCategory::from_str(" Salaries "), Some(ExpenseCategory::Salaries));
        assert_eq!(ExpenseCategory::from_str("Snacks"), None);
    }

    fn expense(concept: &str, amount_cents: i64, day: u32, category: ExpenseCategory) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            concept: concept.to_string(),
            amount_cents,
            spent_on: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            category,
            description: None,
            created_at: Utc::now(),
        }
    }

    fn concepts(expenses: &[Expense]) -> Vec<&str> {
        expenses.iter().map(|e| e.concept.as_str()).collect()
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense("Rent", 2_500_000, 1, ExpenseCategory::Rent),
            expense("Cleaner", 95_000, 10, ExpenseCategory::Supplies),
            expense("Power", 420_000, 5, ExpenseCategory::Utilities),
            expense("Tape", 12_000, 20, ExpenseCategory::Supplies),
        ]
    }

    #[test]
    fn test_filter_sorts() {
        let by = |sort| ExpenseFilter { sort, ..Default::default() }.apply(sample());

        assert_eq!(concepts(&by(ExpenseSort::Newest)), vec!["Tape", "Cleaner", "Power", "Rent"]);
        assert_eq!(concepts(&by(ExpenseSort::Oldest)), vec!["Rent", "Power", "Cleaner", "Tape"]);
        assert_eq!(concepts(&by(ExpenseSort::Largest)), vec!["Rent", "Power", "Cleaner", "Tape"]);
        assert_eq!(concepts(&by(ExpenseSort::Smallest)), vec!["Tape", "Cleaner", "Power", "Rent"]);
        assert_eq!(concepts(&by(ExpenseSort::Category)), vec!["Rent", "Tape", "Cleaner", "Power"]);
    }

    #[test]
    fn test_filter_by_category_and_dates() {
        let supplies = ExpenseFilter {
            category: Some(ExpenseCategory::Supplies),
            ..Default::default()
        };
        assert_eq!(concepts(&supplies.apply(sample())), vec!["Tape", "Cleaner"]);

        let early_march = ExpenseFilter {
            from: NaiveDate::from_ymd_opt(2025, 3, 5),
            to: NaiveDate::from_ymd_opt(2025, 3, 10),
            ..Default::default()
        };
        assert_eq!(concepts(&early_march.apply(sample())), vec!["Cleaner", "Power"]);
    }

    #[test]
    fn test_sort_names() {
        assert_eq!(ExpenseSort::from_str("largest"), Some(ExpenseSort::Largest));
        assert_eq!(ExpenseSort::from_str("bogus"), None);
    }
}
