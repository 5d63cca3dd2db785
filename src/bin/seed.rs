use clap::Parser;
use chrono::{Datelike, NaiveDate, Utc};
use fake::{
    faker::{boolean::en::Boolean, name::en::Name, phone_number::en::PhoneNumber},
    Fake,
};

use dojo::{
    config::Settings,
    db,
    domain::{
        CreateMemberRequest, ExpenseCategory, MemberDetails, RecordExpenseRequest,
        RegisterPaymentRequest, RestockRequest,
    },
    error::AppError,
    service::ServiceContext,
};

/// Fill a development database with members, payments, stock and expenses.
#[derive(Parser, Debug)]
struct Args {
    /// Database URL; defaults to the configured one
    #[arg(long)]
    database_url: Option<String>,

    /// Number of members to create
    #[arg(long, default_value_t = 25)]
    members: usize,

    /// Year to register payments in; defaults to the current year
    #[arg(long)]
    year: Option<i32>,

    /// Chance, in percent, that a member paid any given month
    #[arg(long, default_value_t = 75)]
    paid_ratio: u8,
}

const PLANS: [&str; 2] = ["Open - $2000", "Weights only - $800"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let mut settings = Settings::new().unwrap_or_default();
    if let Some(url) = args.database_url {
        settings.database.url = url;
    }

    println!("📋 Opening {} and running migrations...", settings.database.url);
    let db_pool = db::connect(&settings.database).await?;
    let ctx = ServiceContext::new(db_pool, &settings);

    let today = Utc::now().date_naive();
    let year = args.year.unwrap_or(today.year());
    let last_month = if year == today.year() { today.month() } else { 12 };

    // Seed members
    println!("👥 Creating members...");
    let mut created = Vec::new();
    while created.len() < args.members {
        let id = (1_000_000u32..60_000_000).fake::<u32>().to_string();
        let details = MemberDetails {
            id,
            name: Name().fake(),
            phone: Some(PhoneNumber().fake()),
            emergency_contact_name: Some(Name().fake()),
            emergency_contact_phone: Some(PhoneNumber().fake()),
            birth_date: NaiveDate::from_ymd_opt(
                (1970i32..2012).fake::<i32>(),
                (1u32..=12).fake::<u32>(),
                (1u32..=28).fake::<u32>(),
            ),
            dues_plan: PLANS[(0..PLANS.len()).fake::<usize>()].to_string(),
            medical_notes: None,
            comments: None,
        };

        match ctx.ledger.create_member(CreateMemberRequest { details, photo: None }).await {
            Ok(member) => created.push(member),
            // Random IDs occasionally collide
            Err(AppError::DuplicateId(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    println!("  ✅ Created {} members", created.len());

    // Seed payments
    println!("💵 Registering payments for {}...", year);
    let schedule = ctx.ledger.dues_schedule().await?;
    let mut payments = 0;
    for member in &created {
        for month in 1..=last_month {
            if !Boolean(args.paid_ratio).fake::<bool>() {
                continue;
            }
            let payment_date = NaiveDate::from_ymd_opt(year, month, (1u32..=10).fake::<u32>())
                .unwrap_or(today);
            ctx.ledger
                .register_payment(RegisterPaymentRequest {
                    member_id: member.id.clone(),
                    month,
                    year,
                    amount_cents: schedule.amount_for(&member.dues_plan),
                    payment_date,
                })
                .await?;
            payments += 1;
        }
    }
    println!("  ✅ Registered {} payments", payments);

    // Seed inventory
    println!("📦 Stocking inventory...");
    for (name, cost_cents, price_cents, quantity) in [
        ("Gi (white)", 240_000, 350_000, 8),
        ("Belt", 35_000, 60_000, 20),
        ("Mouthguard", 12_000, 25_000, 15),
        ("Rash guard", 110_000, 180_000, 6),
    ] {
        ctx.inventory_service
            .restock(RestockRequest {
                name: name.to_string(),
                unit_cost_cents: cost_cents,
                unit_price_cents: price_cents,
                quantity,
            })
            .await?;
    }
    println!("  ✅ Stocked 4 products");

    // Seed expenses
    println!("🧾 Recording expenses...");
    for (concept, amount_cents, category) in [
        ("Monthly rent", 2_500_000, ExpenseCategory::Rent),
        ("Electricity", 420_000, ExpenseCategory::Utilities),
        ("Mat cleaner", 95_000, ExpenseCategory::Supplies),
    ] {
        ctx.expense_service
            .record(RecordExpenseRequest {
                concept: concept.to_string(),
                amount_cents,
                spent_on: today,
                category,
                description: None,
            })
            .await?;
    }
    println!("  ✅ Recorded 3 expenses");

    println!("🎉 Seeding complete!");
    Ok(())
}
