pub mod portal;
pub mod templates;
pub mod uploads;

use axum::{extract::DefaultBodyLimit, Router};

use crate::{api::state::AppState, config::PhotoConfig};

// Room for the text fields that travel with an upload
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_web_routes(photos: &PhotoConfig) -> Router<AppState> {
    portal::create_portal_routes()
        .layer(DefaultBodyLimit::max(photos.max_upload_bytes + FORM_OVERHEAD_BYTES))
}
