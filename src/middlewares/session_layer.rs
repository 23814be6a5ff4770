//! Cookie session layer: signed cookie, inactivity expiry.

use tower_sessions::{
    cookie::{time::Duration, Key, SameSite},
    service::SignedCookie,
    Expiry, SessionManagerLayer, SessionStore,
};

use crate::config::{ConfigError, SessionConfig};

/// Build the session layer over `store`. The signing key is derived from
/// `SESSION_SECRET`, which must be at least 64 bytes.
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    config: &SessionConfig,
) -> Result<SessionManagerLayer<S, SignedCookie>, ConfigError> {
    let key = Key::try_from(config.secret.as_bytes())
        .map_err(|e| ConfigError::ValidationError(format!("Unusable SESSION_SECRET: {}", e)))?;

    Ok(SessionManagerLayer::new(store)
        .with_name(config.cookie_name.clone())
        .with_expiry(Expiry::OnInactivity(Duration::minutes(config.inactivity_minutes)))
        .with_secure(config.secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
