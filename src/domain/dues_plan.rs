use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuesPlan {
    pub id: Uuid,
    pub name: String,
    pub fee_cents: i64,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DuesPlan {
    pub fn new(name: &str, fee_cents: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            fee_cents,
            sort_order: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDuesPlanRequest {
    pub name: String,
    pub fee_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateDuesPlanRequest {
    pub fee_cents: Option<i64>,
    pub is_active: Option<bool>,
}

/// Monthly fee lookup for member plan labels.
///
/// Lookup order: exact (case-insensitive) plan name, then the plan whose fee
/// in whole currency units appears in the label (largest fee first, so "2000"
/// beats "200"), then the fallback fee.
#[derive(Debug, Clone)]
pub struct DuesSchedule {
    plans: Vec<DuesPlan>,
    fallback_fee_cents: i64,
}

impl DuesSchedule {
    pub fn new(mut plans: Vec<DuesPlan>, fallback_fee_cents: i64) -> Self {
        plans.sort_by(|a, b| b.fee_cents.cmp(&a.fee_cents));
        Self { plans, fallback_fee_cents }
    }

    pub fn amount_for(&self, label: &str) -> i64 {
        let label = label.trim();

        if let Some(plan) = self.plans.iter().find(|p| p.name.eq_ignore_ascii_case(label)) {
            return plan.fee_cents;
        }

        self.plans
            .iter()
            .filter(|p| p.fee_cents > 0 && p.fee_cents % 100 == 0)
            .find(|p| label.contains(&(p.fee_cents / 100).to_string()))
            .map(|p| p.fee_cents)
            .unwrap_or(self.fallback_fee_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> DuesSchedule {
        DuesSchedule::new(
            vec![
                DuesPlan::new("Weights only - $800", 80_000),
                DuesPlan::new("Open - $2000", 200_000),
            ],
            80_000,
        )
    }

    #[test]
    fn test_exact_name_match() {
        assert_eq!(schedule().amount_for("Open - $2000"), 200_000);
        assert_eq!(schedule().amount_for("weights only - $800"), 80_000);
    }

    #[test]
    fn test_fee_appearing_in_label() {
        assert_eq!(schedule().amount_for("Libre - $2000"), 200_000);
        assert_eq!(schedule().amount_for("Solo Pesas - $800"), 80_000);
    }

    #[test]
    fn test_unknown_label_uses_fallback() {
        assert_eq!(schedule().amount_for("Kids"), 80_000);
        assert_eq!(DuesSchedule::new(vec![], 50_000).amount_for("Open - $2000"), 50_000);
    }
}
