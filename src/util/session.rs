//! Session state: the logged-in user id and one-time flash notices.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

pub type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Session keys.
pub mod keys {
    pub const USER_ID: &str = "user_id";
    pub const FLASHES: &str = "_flashes";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Danger,
}

impl std::fmt::Display for FlashCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlashCategory::Success => write!(f, "success"),
            FlashCategory::Danger => write!(f, "danger"),
        }
    }
}

/// A notice shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

/// Store the authenticated user, rotating the session id first.
pub async fn start_session(session: &Session, user_id: &str) -> SessionResult<()> {
    session.cycle_id().await?;
    session.insert(keys::USER_ID, user_id).await
}

/// Forget the authenticated user; pending flashes are kept.
pub async fn end_session(session: &Session) -> SessionResult<()> {
    session.remove::<String>(keys::USER_ID).await?;
    Ok(())
}

pub async fn current_user_id(session: &Session) -> SessionResult<Option<String>> {
    session.get::<String>(keys::USER_ID).await
}

pub async fn push_flash(session: &Session, category: FlashCategory, message: impl Into<String>) -> SessionResult<()> {
    let mut flashes = session.get::<Vec<Flash>>(keys::FLASHES).await?.unwrap_or_default();
    flashes.push(Flash {
        category,
        message: message.into(),
    });
    session.insert(keys::FLASHES, flashes).await
}

/// Drain pending flashes.
pub async fn take_flashes(session: &Session) -> SessionResult<Vec<Flash>> {
    Ok(session.remove::<Vec<Flash>>(keys::FLASHES).await?.unwrap_or_default())
}
