use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{Expense, ExpenseFilter, RecordExpenseRequest},
    error::{AppError, Result},
    repository::ExpenseRepository,
};

pub struct ExpenseService {
    repo: Arc<dyn ExpenseRepository>,
}

impl ExpenseService {
    pub fn new(repo: Arc<dyn ExpenseRepository>) -> Self {
        Self { repo }
    }

    pub async fn record(&self, request: RecordExpenseRequest) -> Result<Expense> {
        let request = request.normalized();
        request.validate()?;

        let expense = self.repo.create(&request).await?;
        tracing::info!(
            concept = %expense.concept,
            category = expense.category.as_str(),
            amount_cents = expense.amount_cents,
            "Expense recorded"
        );
        Ok(expense)
    }

    pub async fn get(&self, id: Uuid) -> Result<Expense> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Expense>> {
        self.repo.list().await
    }

    pub async fn search(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let expenses = match (filter.from, filter.to) {
            (Some(from), Some(to)) => self.repo.list_between(from, to).await?,
            _ => self.repo.list().await?,
        };
        Ok(filter.apply(expenses))
    }

    /// Replaces every field of an expense.
    pub async fn update(&self, id: Uuid, request: RecordExpenseRequest) -> Result<Expense> {
        let request = request.normalized();
        request.validate()?;

        let expense = self.repo.update(id, &request).await?;
        tracing::info!(
            expense_id = %id,
            concept = %expense.concept,
            amount_cents = expense.amount_cents,
            "Expense updated"
        );
        Ok(expense)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.repo.delete(id).await
    }

    pub async fn total(&self) -> Result<i64> {
        self.repo.total().await
    }
}
