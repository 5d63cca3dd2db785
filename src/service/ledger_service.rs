use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::LedgerConfig,
    domain::*,
    error::{AppError, Result},
    media::ThumbnailEncoder,
    repository::{DuesPlanRepository, MemberRepository, PaymentRepository},
    roster::{self, SkippedRow},
};

/// Outcome of a roster CSV import.
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    #[serde(skip)]
    pub skipped: Vec<SkippedRow>,
}

/// Owns the member registry and the payment ledger. Every write that touches
/// both goes through here.
pub struct MembershipLedger {
    member_repo: Arc<dyn MemberRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    plan_repo: Arc<dyn DuesPlanRepository>,
    thumbnailer: Arc<dyn ThumbnailEncoder>,
    config: LedgerConfig,
}

impl MembershipLedger {
    pub fn new(
        member_repo: Arc<dyn MemberRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        plan_repo: Arc<dyn DuesPlanRepository>,
        thumbnailer: Arc<dyn ThumbnailEncoder>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            member_repo,
            payment_repo,
            plan_repo,
            thumbnailer,
            config,
        }
    }

    pub fn allows_id_rename(&self) -> bool {
        self.config.allow_id_rename
    }

    pub async fn create_member(&self, request: CreateMemberRequest) -> Result<Member> {
        let details = request.details.normalized();
        details.validate(self.config.min_id_digits)?;

        if self.member_repo.find_by_id(&details.id).await?.is_some() {
            return Err(AppError::DuplicateId(details.id));
        }

        let photo = match request.photo {
            Some(bytes) if !bytes.is_empty() => Some(self.encode_photo(bytes).await?),
            _ => None,
        };

        let now = Utc::now();
        let member = build_member(details, photo, now, now);
        let member = self.member_repo.create(&member).await?;

        tracing::info!(member_id = %member.id, dues_plan = %member.dues_plan, "Member created");
        Ok(member)
    }

    pub async fn find_member(&self, id: &str) -> Result<Option<Member>> {
        self.member_repo.find_by_id(id.trim()).await
    }

    pub async fn get_member(&self, id: &str) -> Result<Member> {
        self.find_member(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id.trim())))
    }

    pub async fn list_members(&self) -> Result<Vec<Member>> {
        self.member_repo.list().await
    }

    /// Blank queries list everyone.
    pub async fn search_members(&self, query: &str) -> Result<Vec<Member>> {
        let query = query.trim();
        if query.is_empty() {
            return self.member_repo.list().await;
        }
        self.member_repo.search(query).await
    }

    pub async fn member_count(&self) -> Result<i64> {
        self.member_repo.count().await
    }

    pub async fn update_member(&self, current_id: &str, request: UpdateMemberRequest) -> Result<Member> {
        let existing = self.get_member(current_id).await?;

        let details = request.details.normalized();
        details.validate(self.config.min_id_digits)?;

        let renaming = details.id != existing.id;
        if renaming && !self.config.allow_id_rename {
            return Err(AppError::Validation(
                "The ID number of an existing member cannot be changed".to_string(),
            ));
        }

        let photo = match request.photo {
            PhotoUpdate::Keep => existing.photo.clone(),
            PhotoUpdate::Remove => None,
            PhotoUpdate::Replace(bytes) => Some(self.encode_photo(bytes).await?),
        };

        let member = build_member(details, photo, existing.created_at, Utc::now());
        let member = self.member_repo.update(&existing.id, &member).await?;

        if renaming {
            tracing::info!(old_id = %existing.id, new_id = %member.id, "Member ID changed");
        } else {
            tracing::info!(member_id = %member.id, "Member updated");
        }
        Ok(member)
    }

    pub async fn delete_member(&self, id: &str) -> Result<DeletionSummary> {
        let summary = self.member_repo.delete(id.trim()).await?;

        tracing::info!(
            member_id = %summary.member_id,
            payments_deleted = summary.payments_deleted,
            "Member deleted"
        );
        Ok(summary)
    }

    pub async fn register_payment(&self, request: RegisterPaymentRequest) -> Result<Payment> {
        request.validate()?;
        let member = self.get_member(&request.member_id).await?;

        if self
            .payment_repo
            .find_for_period(&member.id, request.month, request.year)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicatePayment {
                member_id: member.id,
                month: request.month,
                year: request.year,
            });
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            member_id: member.id,
            month: request.month,
            year: request.year,
            amount_cents: request.amount_cents,
            payment_date: request.payment_date,
            dues_plan_snapshot: member.dues_plan,
            created_at: Utc::now(),
        };
        let payment = self.payment_repo.create(&payment).await?;

        tracing::info!(
            member_id = %payment.member_id,
            period = %payment.period_label(),
            amount_cents = payment.amount_cents,
            "Payment registered"
        );
        Ok(payment)
    }

    pub async fn find_payment(&self, member_id: &str, month: u32, year: i32) -> Result<Option<Payment>> {
        self.payment_repo.find_for_period(member_id.trim(), month, year).await
    }

    pub async fn payment_history(&self, member_id: &str) -> Result<Vec<Payment>> {
        self.payment_repo.find_by_member(member_id.trim()).await
    }

    pub async fn payments_for_year(&self, year: i32) -> Result<Vec<Payment>> {
        self.payment_repo.list_for_year(year).await
    }

    pub async fn recent_payments(&self, limit: i64) -> Result<Vec<Payment>> {
        self.payment_repo.list_recent(limit).await
    }

    pub async fn income_for_year(&self, year: i32) -> Result<i64> {
        self.payment_repo.total_for_year(year).await
    }

    /// Inactive plans still price the members that carry their label.
    pub async fn dues_schedule(&self) -> Result<DuesSchedule> {
        let plans = self.plan_repo.list(true).await?;
        Ok(DuesSchedule::new(plans, self.config.fallback_fee_cents))
    }

    pub async fn default_amount_for(&self, member_id: &str) -> Result<i64> {
        let member = self.get_member(member_id).await?;
        Ok(self.dues_schedule().await?.amount_for(&member.dues_plan))
    }

    pub async fn list_pending_payments(&self, year: i32, as_of_month: u32) -> Result<PendingReport> {
        validate_period(as_of_month, year)?;

        let members = self.member_repo.list().await?;
        let payments = self.payment_repo.list_for_year(year).await?;
        let schedule = self.dues_schedule().await?;

        Ok(PendingReport::new(year, as_of_month, members, &payments, schedule))
    }

    /// Upserts members from a roster CSV. Existing members keep their photo
    /// and creation time; their IDs are never changed by an import. Valid
    /// rows are written in one transaction, so a storage failure leaves the
    /// registry as it was.
    pub async fn import_members(&self, data: &[u8]) -> Result<ImportSummary> {
        let parsed = roster::parse_members(data)?;
        let mut summary = ImportSummary {
            skipped: parsed.skipped,
            ..Default::default()
        };

        let now = Utc::now();
        let mut members = Vec::with_capacity(parsed.rows.len());
        for (line, details) in parsed.rows {
            match details.validate(self.config.min_id_digits) {
                Ok(()) => members.push(build_member(details, None, now, now)),
                Err(e) => summary.skipped.push(SkippedRow { line, reason: e.user_message() }),
            }
        }

        let counts = self.member_repo.import(&members).await?;
        summary.created = counts.created;
        summary.updated = counts.updated;

        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped.len(),
            "Roster imported"
        );
        Ok(summary)
    }

    pub async fn export_members(&self) -> Result<Vec<u8>> {
        let members = self.member_repo.list().await?;
        roster::export_members(&members)
    }

    async fn encode_photo(&self, bytes: Vec<u8>) -> Result<Vec<u8>> {
        let thumbnailer = Arc::clone(&self.thumbnailer);
        let encoded = tokio::task::spawn_blocking(move || thumbnailer.encode_thumbnail(&bytes))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

        tracing::debug!(width = encoded.width, height = encoded.height, "Photo encoded");
        Ok(encoded.bytes)
    }
}

fn build_member(
    details: MemberDetails,
    photo: Option<Vec<u8>>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> Member {
    Member {
        id: details.id,
        name: details.name,
        phone: details.phone,
        emergency_contact_name: details.emergency_contact_name,
        emergency_contact_phone: details.emergency_contact_phone,
        birth_date: details.birth_date,
        dues_plan: details.dues_plan,
        medical_notes: details.medical_notes,
        comments: details.comments,
        photo,
        created_at,
        updated_at,
    }
}
