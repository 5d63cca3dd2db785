use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dojo::{api, config::Settings, db, service::ServiceContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dojo=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting Dojo server on {}", settings.bind_address());

    // Initialize database and run migrations
    let db_pool = db::connect(&settings.database).await?;

    if settings.ledger.allow_id_rename {
        tracing::info!("Member ID renaming is enabled");
    }

    let service_context = Arc::new(ServiceContext::new(db_pool, &settings));
    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(settings.bind_address()).await?;

    tracing::info!("Server listening on http://{}", settings.bind_address());

    axum::serve(listener, app).await?;

    Ok(())
}
