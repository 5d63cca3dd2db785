use axum::{extract::State, http::StatusCode, Json, response::IntoResponse};
use serde_json::json;

use crate::api::state::AppState;

pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "Dojo API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Membership ledger for a martial-arts academy",
        "endpoints": {
            "health": "/health",
            "members": "/api/members",
            "payments": "/api/payments",
            "pending": "/api/payments/pending",
            "finance": "/api/finance"
        }
    }))
}

/// Reports whether the database answers a trivial query.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.service_context.db_pool)
        .await;

    match database {
        Ok(_) => (StatusCode::OK, Json(json!({
            "status": "healthy",
            "database": "ok",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({
                "status": "unhealthy",
                "database": "unreachable",
                "timestamp": chrono::Utc::now().to_rfc3339()
            })))
        }
    }
}
