pub mod ledger_service;
pub mod dues_plan_service;
pub mod inventory_service;
pub mod expense_service;
pub mod finance_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::config::Settings;
use crate::media::JpegThumbnailer;
use crate::repository::*;
use dues_plan_service::DuesPlanService;
use expense_service::ExpenseService;
use finance_service::FinanceService;
use inventory_service::InventoryService;

pub use ledger_service::{ImportSummary, MembershipLedger};

pub struct ServiceContext {
    pub ledger: Arc<MembershipLedger>,
    pub dues_plan_service: Arc<DuesPlanService>,
    pub inventory_service: Arc<InventoryService>,
    pub expense_service: Arc<ExpenseService>,
    pub finance_service: Arc<FinanceService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, settings: &Settings) -> Self {
        // Create repositories
        let member_repo: Arc<dyn MemberRepository> =
            Arc::new(SqliteMemberRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
        let plan_repo: Arc<dyn DuesPlanRepository> =
            Arc::new(SqliteDuesPlanRepository::new(db_pool.clone()));
        let inventory_repo = Arc::new(SqliteInventoryRepository::new(db_pool.clone()));
        let expense_repo: Arc<dyn ExpenseRepository> =
            Arc::new(SqliteExpenseRepository::new(db_pool.clone()));

        let thumbnailer = Arc::new(JpegThumbnailer::from_config(&settings.photos));

        let ledger = Arc::new(MembershipLedger::new(
            member_repo.clone(),
            payment_repo.clone(),
            plan_repo.clone(),
            thumbnailer,
            settings.ledger.clone(),
        ));
        let dues_plan_service = Arc::new(DuesPlanService::new(plan_repo, member_repo));
        let inventory_service = Arc::new(InventoryService::new(inventory_repo));
        let expense_service = Arc::new(ExpenseService::new(expense_repo.clone()));
        let finance_service = Arc::new(FinanceService::new(payment_repo, expense_repo));

        Self {
            ledger,
            dues_plan_service,
            inventory_service,
            expense_service,
            finance_service,
            db_pool,
        }
    }
}
