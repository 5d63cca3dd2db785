use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod member_repository;
pub mod payment_repository;
pub mod dues_plan_repository;
pub mod inventory_repository;
pub mod expense_repository;

pub use member_repository::SqliteMemberRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use dues_plan_repository::SqliteDuesPlanRepository;
pub use inventory_repository::SqliteInventoryRepository;
pub use expense_repository::SqliteExpenseRepository;

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Fails with `DuplicateId` when the ID is taken.
    async fn create(&self, member: &Member) -> Result<Member>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Member>>;
    async fn list(&self) -> Result<Vec<Member>>;
    /// Case-insensitive substring match on name, or substring match on ID.
    async fn search(&self, query: &str) -> Result<Vec<Member>>;
    async fn count(&self) -> Result<i64>;
    async fn count_by_plan(&self, plan_name: &str) -> Result<i64>;
    /// Replaces the stored row for `current_id` with `member`. When
    /// `member.id` differs, the row and every payment referencing it move to
    /// the new ID in one transaction.
    async fn update(&self, current_id: &str, member: &Member) -> Result<Member>;
    /// Deletes the member and its payments in one transaction.
    async fn delete(&self, id: &str) -> Result<DeletionSummary>;
    /// Inserts new members and updates existing ones in one transaction.
    /// Updates leave the photo and creation time alone. Any failure rolls
    /// back the whole batch.
    async fn import(&self, members: &[Member]) -> Result<ImportCounts>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Fails with `DuplicatePayment` when the period is already paid.
    async fn create(&self, payment: &Payment) -> Result<Payment>;
    async fn find_for_period(&self, member_id: &str, month: u32, year: i32) -> Result<Option<Payment>>;
    async fn find_by_member(&self, member_id: &str) -> Result<Vec<Payment>>;
    async fn list_for_year(&self, year: i32) -> Result<Vec<Payment>>;
    async fn list_recent(&self, limit: i64) -> Result<Vec<Payment>>;
    async fn total_for_year(&self, year: i32) -> Result<i64>;
}

#[async_trait]
pub trait DuesPlanRepository: Send + Sync {
    async fn create(&self, request: CreateDuesPlanRequest) -> Result<DuesPlan>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DuesPlan>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<DuesPlan>>;
    async fn list(&self, include_inactive: bool) -> Result<Vec<DuesPlan>>;
    async fn update(&self, id: Uuid, request: UpdateDuesPlanRequest) -> Result<DuesPlan>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn restock(&self, request: &RestockRequest) -> Result<InventoryItem>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<InventoryItem>>;
    async fn list(&self) -> Result<Vec<InventoryItem>>;
    /// Overwrites the stock count, e.g. after a physical count.
    async fn set_stock(&self, id: Uuid, stock: i64) -> Result<InventoryItem>;
    /// Adds `delta` (negative to take stock out). Fails with `Validation`
    /// rather than going below zero.
    async fn adjust_stock(&self, id: Uuid, delta: i64) -> Result<InventoryItem>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    async fn create(&self, request: &RecordExpenseRequest) -> Result<Expense>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Expense>>;
    /// Expenses dated within `from..=to`, oldest first.
    async fn list_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Expense>>;
    async fn update(&self, id: Uuid, request: &RecordExpenseRequest) -> Result<Expense>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn total(&self) -> Result<i64>;
}
