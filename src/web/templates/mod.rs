use askama::Template;
use axum::{
    response::{Html, IntoResponse, Response},
    http::StatusCode,
};
use serde::Deserialize;

use crate::error::AppError;

/// One-shot messages carried across a redirect in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub notice: Option<String>,
    pub error: Option<String>,
}

// Shown by base.html above every page's content
#[derive(Debug, Clone, Default)]
pub struct Flash {
    pub notice: String,
    pub error: String,
}

impl Flash {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            notice: String::new(),
            error: message.into(),
        }
    }
}

impl From<FlashQuery> for Flash {
    fn from(query: FlashQuery) -> Self {
        Self {
            notice: query.notice.unwrap_or_default(),
            error: query.error.unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub flash: Flash,
    pub title: String,
    pub message: String,
    pub retryable: bool,
}

// Make askama templates work with axum
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "Template rendering failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to render template: {}", err),
                ).into_response()
            }
        }
    }
}

/// Renders an error as a full page with the error's status code.
pub fn error_page(err: AppError) -> Response {
    let status = err.status_code();
    let template = ErrorTemplate {
        flash: Flash::default(),
        title: status.canonical_reason().unwrap_or("Error").to_string(),
        message: err.user_message(),
        retryable: err.is_retryable(),
    };

    (status, HtmlTemplate(template)).into_response()
}
