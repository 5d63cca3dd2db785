use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::{check_amount, checked_product, checked_total, DuesSchedule, Member};

pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub member_id: String,
    pub month: u32,
    pub year: i32,
    pub amount_cents: i64,
    pub payment_date: NaiveDate,
    /// The member's plan label when the payment was taken. Never updated.
    pub dues_plan_snapshot: String,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn period_label(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPaymentRequest {
    pub member_id: String,
    pub month: u32,
    pub year: i32,
    pub amount_cents: i64,
    pub payment_date: NaiveDate,
}

impl RegisterPaymentRequest {
    pub fn validate(&self) -> Result<()> {
        validate_period(self.month, self.year)?;
        if self.amount_cents <= 0 {
            return Err(AppError::Validation(
                "Payment amount must be greater than zero".to_string(),
            ));
        }
        check_amount(self.amount_cents, "Payment amount")
    }
}

pub fn validate_period(month: u32, year: i32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(AppError::Validation(format!("Invalid month: {}", month)));
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(AppError::Validation(format!("Invalid year: {}", year)));
    }
    Ok(())
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("?")
}

/// One member's unpaid months.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingDues {
    pub member: Member,
    pub missing_months: Vec<u32>,
    pub monthly_fee_cents: i64,
    pub total_due_cents: i64,
}

impl PendingDues {
    pub fn missing_count(&self) -> usize {
        self.missing_months.len()
    }
}

/// Snapshot of the data needed to work out who owes what for a year.
///
/// The report does the arithmetic lazily: `iter()` walks the members and
/// yields only those with unpaid months. It can be iterated any number of
/// times. A total that does not fit in i64 comes out as a Validation error.
#[derive(Debug, Clone)]
pub struct PendingReport {
    pub year: i32,
    pub as_of_month: u32,
    members: Vec<Member>,
    paid: HashSet<(String, u32)>,
    schedule: DuesSchedule,
}

impl PendingReport {
    pub fn new(
        year: i32,
        as_of_month: u32,
        members: Vec<Member>,
        payments: &[Payment],
        schedule: DuesSchedule,
    ) -> Self {
        let paid = payments
            .iter()
            .filter(|p| p.year == year)
            .map(|p| (p.member_id.clone(), p.month))
            .collect();

        Self { year, as_of_month, members, paid, schedule }
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<PendingDues>> + '_ {
        self.members.iter().filter_map(move |member| {
            let missing_months: Vec<u32> = (1..=self.as_of_month)
                .filter(|month| !self.paid.contains(&(member.id.clone(), *month)))
                .collect();

            if missing_months.is_empty() {
                return None;
            }

            let monthly_fee_cents = self.schedule.amount_for(&member.dues_plan);
            let total = checked_product(monthly_fee_cents, missing_months.len() as i64);
            Some(total.map(|total_due_cents| PendingDues {
                member: member.clone(),
                total_due_cents,
                missing_months,
                monthly_fee_cents,
            }))
        })
    }

    /// Every pending entry, or the first arithmetic error.
    pub fn entries(&self) -> Result<Vec<PendingDues>> {
        self.iter().collect()
    }

    pub fn grand_total_cents(&self) -> Result<i64> {
        let mut totals = Vec::new();
        for entry in self.iter() {
            totals.push(entry?.total_due_cents);
        }
        checked_total(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DuesPlan;

    fn member(id: &str, plan: &str) -> Member {
        Member {
            id: id.to_string(),
            name: format!("Member {}", id),
            phone: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            birth_date: None,
            dues_plan: plan.to_string(),
            medical_notes: None,
            comments: None,
            photo: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn payment(member_id: &str, month: u32, year: i32) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            member_id: member_id.to_string(),
            month,
            year,
            amount_cents: 200_000,
            payment_date: NaiveDate::from_ymd_opt(year, month, 10).unwrap(),
            dues_plan_snapshot: "Open - $2000".to_string(),
            created_at: Utc::now(),
        }
    }

    fn schedule() -> DuesSchedule {
        DuesSchedule::new(
            vec![
                DuesPlan::new("Open - $2000", 200_000),
                DuesPlan::new("Weights only - $800", 80_000),
            ],
            80_000,
        )
    }

    #[test]
    fn test_unpaid_member_owes_every_month() {
        let report = PendingReport::new(2025, 6, vec![member("12345678", "Open - $2000")], &[], schedule());
        let pending = report.entries().unwrap();

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].missing_count(), 6);
        assert_eq!(pending[0].total_due_cents, 1_200_000);
    }

    #[test]
    fn test_fully_paid_members_are_omitted() {
        let payments: Vec<_> = (1..=3).map(|m| payment("12345678", m, 2025)).collect();
        let report = PendingReport::new(
            2025,
            3,
            vec![member("12345678", "Open - $2000"), member("87654321", "Weights only - $800")],
            &payments,
            schedule(),
        );

        let pending = report.entries().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].member.id, "87654321");
        assert_eq!(pending[0].total_due_cents, 240_000);
    }

    #[test]
    fn test_payments_from_other_years_do_not_count() {
        let payments = vec![payment("12345678", 1, 2024)];
        let report = PendingReport::new(2025, 1, vec![member("12345678", "Open - $2000")], &payments, schedule());

        assert_eq!(report.iter().count(), 1);
    }

    #[test]
    fn test_report_is_restartable() {
        let report = PendingReport::new(2025, 2, vec![member("12345678", "Open - $2000")], &[], schedule());

        assert_eq!(report.iter().count(), 1);
        assert_eq!(report.iter().count(), 1);
        assert_eq!(report.grand_total_cents().unwrap(), 400_000);
    }

    #[test]
    fn test_oversized_fee_is_an_error_not_a_wrap() {
        let schedule = DuesSchedule::new(vec![DuesPlan::new("Huge", i64::MAX / 2)], 80_000);
        let report = PendingReport::new(2025, 3, vec![member("12345678", "Huge")], &[], schedule);

        assert!(matches!(report.entries(), Err(AppError::Validation(_))));
        assert!(matches!(report.grand_total_cents(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_grand_total_overflow_is_an_error() {
        let schedule = DuesSchedule::new(vec![DuesPlan::new("Big", i64::MAX / 4)], 80_000);
        let members = vec![member("11111111", "Big"), member("22222222", "Big"), member("33333333", "Big")];
        let report = PendingReport::new(2025, 1, members, &[], schedule);

        assert_eq!(report.entries().unwrap().len(), 3);
        assert!(matches!(report.grand_total_cents(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_payment_amount_is_capped() {
        let request = RegisterPaymentRequest {
            member_id: "12345678".to_string(),
            month: 1,
            year: 2025,
            amount_cents: crate::domain::MAX_AMOUNT_CENTS + 1,
            payment_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        };
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "?");
        assert_eq!(month_name(13), "?");
    }
}
