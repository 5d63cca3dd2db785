mod common;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use dojo::{
    config::Settings,
    domain::{
        CreateDuesPlanRequest, ExpenseCategory, ExpenseFilter, ExpenseSort, Payment,
        RecordExpenseRequest, RegisterPaymentRequest, RestockRequest, UpdateDuesPlanRequest,
        MAX_AMOUNT_CENTS,
    },
    error::AppError,
    repository::{
        MemberRepository, PaymentRepository, SqliteMemberRepository, SqlitePaymentRepository,
    },
    service::ServiceContext,
};
use uuid::Uuid;

use common::{new_member, test_context, test_pool};

fn payment(member_id: &str, month: u32, year: i32) -> Payment {
    Payment {
        id: Uuid::new_v4(),
        member_id: member_id.to_string(),
        month,
        year,
        amount_cents: 200_000,
        payment_date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
        dues_plan_snapshot: "Open - $2000".to_string(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_schema_cascades_member_deletes() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let ctx = ServiceContext::new(pool.clone(), &Settings::default());
    ctx.ledger.create_member(new_member("12345678", "Juan Perez", "Open - $2000")).await?;

    let payments: Arc<dyn PaymentRepository> = Arc::new(SqlitePaymentRepository::new(pool.clone()));
    payments.create(&payment("12345678", 1, 2025)).await?;
    payments.create(&payment("12345678", 2, 2025)).await?;

    // Bypass the repository so only the foreign key is at work
    sqlx::query("DELETE FROM members WHERE id = ?")
        .bind("12345678")
        .execute(&pool)
        .await?;

    assert!(payments.find_by_member("12345678").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_payment_requires_existing_member() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let payments = SqlitePaymentRepository::new(pool);

    let result = payments.create(&payment("99999999", 1, 2025)).await;

    assert!(result.is_err());
    assert!(payments.find_by_member("99999999").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unique_period_constraint() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let members = SqliteMemberRepository::new(pool.clone());
    let payments = SqlitePaymentRepository::new(pool);

    let now = Utc::now();
    members
        .create(&dojo::domain::Member {
            id: "12345678".to_string(),
            name: "Juan Perez".to_string(),
            phone: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            birth_date: None,
            dues_plan: "Open - $2000".to_string(),
            medical_notes: None,
            comments: None,
            photo: None,
            created_at: now,
            updated_at: now,
        })
        .await?;

    payments.create(&payment("12345678", 5, 2025)).await?;
    let result = payments.create(&payment("12345678", 5, 2025)).await;

    assert!(matches!(result, Err(AppError::DuplicatePayment { month: 5, year: 2025, .. })));
    assert_eq!(payments.find_by_member("12345678").await?.len(), 1);
    assert_eq!(payments.total_for_year(2025).await?, 200_000);
    assert_eq!(payments.total_for_year(2024).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_count_by_plan() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    ctx.ledger.create_member(new_member("12345678", "Juan Perez", "Open - $2000")).await?;
    ctx.ledger.create_member(new_member("87654321", "Ana Garcia", "Open - $2000")).await?;
    ctx.ledger.create_member(new_member("55555555", "Luis Gomez", "Weights only - $800")).await?;

    assert_eq!(ctx.dues_plan_service.member_count("Open - $2000").await?, 2);
    assert_eq!(ctx.dues_plan_service.member_count("Weights only - $800").await?, 1);
    assert_eq!(ctx.dues_plan_service.member_count("Kids").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_default_plans_are_seeded() -> anyhow::Result<()> {
    let ctx = test_context().await?;

    let plans = ctx.dues_plan_service.list(false).await?;
    let names: Vec<&str> = plans.iter().map(|p| p.name.as_str()).collect();

    assert_eq!(names, vec!["Open - $2000", "Weights only - $800"]);
    assert_eq!(plans[0].fee_cents, 200_000);
    assert_eq!(plans[1].fee_cents, 80_000);
    Ok(())
}

#[tokio::test]
async fn test_dues_plan_lifecycle() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let plans = &ctx.dues_plan_service;

    let kids = plans
        .create(CreateDuesPlanRequest { name: "  Kids - $600 ".to_string(), fee_cents: 60_000 })
        .await?;
    assert_eq!(kids.name, "Kids - $600");

    let duplicate = plans
        .create(CreateDuesPlanRequest { name: "Kids - $600".to_string(), fee_cents: 50_000 })
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let negative = plans
        .create(CreateDuesPlanRequest { name: "Broken".to_string(), fee_cents: -1 })
        .await;
    assert!(matches!(negative, Err(AppError::Validation(_))));

    ctx.ledger.create_member(new_member("12345678", "Juan Perez", "Kids - $600")).await?;
    assert!(matches!(plans.delete(kids.id).await, Err(AppError::Conflict(_))));

    // Deactivated plans still price their members
    plans
        .update(kids.id, UpdateDuesPlanRequest { fee_cents: Some(65_000), is_active: Some(false) })
        .await?;
    assert!(plans.list(false).await?.iter().all(|p| p.id != kids.id));
    assert_eq!(ctx.ledger.default_amount_for("12345678").await?, 65_000);

    ctx.ledger.delete_member("12345678").await?;
    plans.delete(kids.id).await?;
    assert!(plans.list(true).await?.iter().all(|p| p.id != kids.id));
    assert!(matches!(plans.delete(kids.id).await, Err(AppError::NotFound(_))));

    Ok(())
}

fn restock(name: &str, cost: i64, price: i64, quantity: i64) -> RestockRequest {
    RestockRequest {
        name: name.to_string(),
        unit_cost_cents: cost,
        unit_price_cents: price,
        quantity,
    }
}

#[tokio::test]
async fn test_restock_adds_to_existing_stock() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let inventory = &ctx.inventory_service;

    let first = inventory.restock(restock("Belt", 40_000, 60_000, 10)).await?;
    let second = inventory.restock(restock(" Belt ", 45_000, 65_000, 5)).await?;

    assert_eq!(first.id, second.id);
    assert_eq!(second.stock, 15);
    assert_eq!(second.unit_cost_cents, 45_000);
    assert_eq!(second.unit_price_cents, 65_000);
    assert_eq!(second.unit_profit_cents(), 20_000);
    assert_eq!(inventory.list().await?.len(), 1);

    let valuation = inventory.valuation().await?;
    assert_eq!(valuation.sale_cents, 975_000);
    assert_eq!(valuation.cost_cents, 675_000);
    assert_eq!(valuation.potential_profit_cents, 300_000);

    let invalid = inventory.restock(restock("Gloves", 0, 10_000, -1)).await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));
    let loss = inventory.restock(restock("Gloves", 12_000, 10_000, 1)).await;
    assert!(matches!(loss, Err(AppError::Validation(_))));

    inventory.delete(second.id).await?;
    assert!(inventory.list().await?.is_empty());
    assert!(matches!(inventory.delete(second.id).await, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_stock_can_be_set_and_sold() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let inventory = &ctx.inventory_service;
    let belt = inventory.restock(restock("Belt", 40_000, 60_000, 10)).await?;

    let counted = inventory.set_stock(belt.id, 7).await?;
    assert_eq!(counted.stock, 7);

    let sold = inventory.sell(belt.id, 3).await?;
    assert_eq!(sold.stock, 4);

    let oversold = inventory.sell(belt.id, 5).await;
    assert!(matches!(oversold, Err(AppError::Validation(_))));
    assert_eq!(inventory.list().await?[0].stock, 4);

    assert!(matches!(inventory.sell(belt.id, 0).await, Err(AppError::Validation(_))));
    assert!(matches!(inventory.set_stock(belt.id, -1).await, Err(AppError::Validation(_))));

    let missing = uuid::Uuid::new_v4();
    assert!(matches!(inventory.set_stock(missing, 1).await, Err(AppError::NotFound(_))));
    assert!(matches!(inventory.sell(missing, 1).await, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_expenses_total() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let expenses = &ctx.expense_service;
    let spent_on = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

    let rent = expenses
        .record(RecordExpenseRequest {
            concept: "Monthly rent".to_string(),
            amount_cents: 2_500_000,
            spent_on,
            category: ExpenseCategory::Rent,
            description: Some("   ".to_string()),
        })
        .await?;
    expenses
        .record(RecordExpenseRequest {
            concept: "Mat cleaner".to_string(),
            amount_cents: 95_000,
            spent_on,
            category: ExpenseCategory::Supplies,
            description: None,
        })
        .await?;

    assert_eq!(rent.description, None);
    assert_eq!(expenses.list().await?.len(), 2);
    assert_eq!(expenses.total().await?, 2_595_000);

    expenses.delete(rent.id).await?;
    assert_eq!(expenses.total().await?, 95_000);
    assert!(matches!(expenses.delete(rent.id).await, Err(AppError::NotFound(_))));

    let zero = expenses
        .record(RecordExpenseRequest {
            concept: "Nothing".to_string(),
            amount_cents: 0,
            spent_on,
            category: ExpenseCategory::Other,
            description: None,
        })
        .await;
    assert!(matches!(zero, Err(AppError::Validation(_))));

    Ok(())
}

fn expense(concept: &str, amount_cents: i64, spent_on: NaiveDate, category: ExpenseCategory) -> RecordExpenseRequest {
    RecordExpenseRequest {
        concept: concept.to_string(),
        amount_cents,
        spent_on,
        category,
        description: None,
    }
}

#[tokio::test]
async fn test_expense_update_and_filter() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let expenses = &ctx.expense_service;
    let march = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let april = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();

    let power = expenses.record(expense("Power", 420_000, march, ExpenseCategory::Utilities)).await?;
    expenses.record(expense("Rent", 2_500_000, april, ExpenseCategory::Rent)).await?;
    expenses.record(expense("Water", 80_000, april, ExpenseCategory::Utilities)).await?;

    let mut changed = expense(" Electricity ", 450_000, april, ExpenseCategory::Utilities);
    changed.description = Some("March bill".to_string());
    let updated = expenses.update(power.id, changed).await?;
    assert_eq!(updated.id, power.id);
    assert_eq!(updated.concept, "Electricity");
    assert_eq!(updated.amount_cents, 450_000);
    assert_eq!(expenses.get(power.id).await?.description.as_deref(), Some("March bill"));

    let invalid = expenses.update(power.id, expense("Power", 0, march, ExpenseCategory::Utilities)).await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));
    let missing = expenses
        .update(uuid::Uuid::new_v4(), expense("Power", 1, march, ExpenseCategory::Utilities))
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let utilities = ExpenseFilter {
        category: Some(ExpenseCategory::Utilities),
        sort: ExpenseSort::Largest,
        ..Default::default()
    };
    let found: Vec<String> = expenses.search(&utilities).await?.into_iter().map(|e| e.concept).collect();
    assert_eq!(found, vec!["Electricity", "Water"]);

    let in_april = ExpenseFilter { from: Some(april), to: Some(april), ..Default::default() };
    assert_eq!(expenses.search(&in_april).await?.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_finance_summary_for_year() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    ctx.ledger.create_member(new_member("12345678", "Juan Perez", "Open - $2000")).await?;
    for month in [1, 2] {
        ctx.ledger
            .register_payment(RegisterPaymentRequest {
                member_id: "12345678".to_string(),
                month,
                year: 2025,
                amount_cents: 200_000,
                payment_date: NaiveDate::from_ymd_opt(2025, month, 5).unwrap(),
            })
            .await?;
    }
    let feb = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
    ctx.expense_service.record(expense("Rent", 250_000, feb, ExpenseCategory::Rent)).await?;
    let last_year = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
    ctx.expense_service.record(expense("Rent", 999_000, last_year, ExpenseCategory::Rent)).await?;

    let summary = ctx.finance_service.summary(2025, 3).await?;

    assert_eq!(summary.months.len(), 3);
    assert_eq!(summary.months[0].balance_cents, 200_000);
    assert_eq!(summary.months[1].balance_cents, -50_000);
    assert_eq!(summary.months[2].balance_cents, 0);
    assert_eq!(summary.income_cents, 400_000);
    assert_eq!(summary.expense_cents, 250_000);
    assert_eq!(summary.balance_cents, 150_000);
    assert_eq!(summary.by_category.len(), 1);
    assert_eq!(summary.by_category[0].total_cents, 250_000);

    assert!(matches!(ctx.finance_service.summary(1999, 1).await, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_oversized_amounts_are_rejected() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let plans = &ctx.dues_plan_service;

    let huge = plans
        .create(CreateDuesPlanRequest { name: "Huge".to_string(), fee_cents: MAX_AMOUNT_CENTS + 1 })
        .await;
    assert!(matches!(huge, Err(AppError::Validation(_))));

    let spent_on = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let gold = ctx
        .expense_service
        .record(expense("Gold mats", MAX_AMOUNT_CENTS + 1, spent_on, ExpenseCategory::Supplies))
        .await;
    assert!(matches!(gold, Err(AppError::Validation(_))));

    Ok(())
}
