use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{check_amount, CreateDuesPlanRequest, DuesPlan, UpdateDuesPlanRequest},
    error::{AppError, Result},
    repository::{DuesPlanRepository, MemberRepository},
};

pub struct DuesPlanService {
    repo: Arc<dyn DuesPlanRepository>,
    member_repo: Arc<dyn MemberRepository>,
}

impl DuesPlanService {
    pub fn new(repo: Arc<dyn DuesPlanRepository>, member_repo: Arc<dyn MemberRepository>) -> Self {
        Self { repo, member_repo }
    }

    /// List all dues plans
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<DuesPlan>> {
        self.repo.list(include_inactive).await
    }

    /// Create a new dues plan
    pub async fn create(&self, request: CreateDuesPlanRequest) -> Result<DuesPlan> {
        let request = CreateDuesPlanRequest {
            name: request.name.trim().to_string(),
            ..request
        };

        if request.name.is_empty() {
            return Err(AppError::Validation("Plan name is required".to_string()));
        }

        check_amount(request.fee_cents, "Fee")?;

        if self.repo.find_by_name(&request.name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A dues plan named '{}' already exists",
                request.name
            )));
        }

        let plan = self.repo.create(request).await?;
        tracing::info!(plan = %plan.name, fee_cents = plan.fee_cents, "Dues plan created");
        Ok(plan)
    }

    /// Update fee or active flag
    pub async fn update(&self, id: Uuid, request: UpdateDuesPlanRequest) -> Result<DuesPlan> {
        if let Some(fee_cents) = request.fee_cents {
            check_amount(fee_cents, "Fee")?;
        }

        self.repo.update(id, request).await
    }

    pub async fn member_count(&self, plan_name: &str) -> Result<i64> {
        self.member_repo.count_by_plan(plan_name).await
    }

    /// Delete a dues plan that no member uses
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let plan = self.repo.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Dues plan not found".to_string())
        })?;

        // Cannot delete if in use
        let usage_count = self.member_repo.count_by_plan(&plan.name).await?;
        if usage_count > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete dues plan: {} members are still on it. Deactivate it instead.",
                usage_count
            )));
        }

        self.repo.delete(id).await?;
        tracing::info!(plan = %plan.name, "Dues plan deleted");
        Ok(())
    }
}
