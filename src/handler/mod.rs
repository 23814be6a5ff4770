pub mod invoice_handler;
pub mod page_handler;
pub mod user_handler;

use askama::Template;
use axum::response::Html;
use tower_sessions::Session;
use tracing::error;

use crate::util::error::HandlerError;
use crate::util::session::{take_flashes, Flash};

pub(crate) fn render<T: Template>(template: &T) -> Result<Html<String>, HandlerError> {
    template.render().map(Html).map_err(|e| {
        error!("Template render failed: {e}");
        HandlerError::internal("Failed to render page")
    })
}

/// Pending flashes for the page being rendered; a broken session shows none.
pub(crate) async fn page_flashes(session: &Session) -> Vec<Flash> {
    take_flashes(session).await.unwrap_or_else(|e| {
        error!("Failed to read flash notices: {e}");
        Vec::new()
    })
}

pub(crate) fn session_error(err: tower_sessions::session::Error) -> HandlerError {
    error!("Session store error: {err}");
    HandlerError::internal("Session unavailable")
}
