pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::get,
};
use tower_http::{
    compression::CompressionLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
    web,
};
use state::AppState;

/// The whole application: HTML pages, the JSON API and the health check.
pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings.clone());

    Router::new()
        .route("/health", get(handlers::root::health_check))

        // API routes
        .nest("/api", api_routes())

        // Server-rendered pages
        .merge(web::create_web_routes(&settings.photos))

        // Add state to the router
        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root::api_info))
        .nest("/members", member_routes())
        .nest("/payments", payment_routes())
        .route("/finance", get(handlers::finance::summary))
}

fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::members::list).post(handlers::members::create))
        .route(
            "/:id",
            get(handlers::members::get)
                .put(handlers::members::update)
                .delete(handlers::members::delete),
        )
        .route("/:id/payments", get(handlers::members::payments))
        .route("/:id/default-amount", get(handlers::members::default_amount))
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(handlers::payments::register))
        .route("/pending", get(handlers::payments::pending))
        .route("/:member_id/:year/:month", get(handlers::payments::get))
}
