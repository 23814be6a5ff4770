use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{debug, error};

use crate::util::error::HandlerError;
use crate::util::session::current_user_id;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page.";

/// Identity of the logged-in user, placed in request extensions by [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: String,
}

/// Login page variant that shows [`LOGIN_REQUIRED_MESSAGE`].
pub const LOGIN_REQUIRED_REDIRECT: &str = "/login?required=1";

/// Gate for protected routes: without a session user the request is
/// redirected to the login page. Nothing is written to the session, so
/// anonymous requests never create a stored session.
pub async fn require_auth(session: Session, mut req: Request<Body>, next: Next) -> Response {
    match current_user_id(&session).await {
        Ok(Some(id)) => {
            req.extensions_mut().insert(AuthenticatedUser { id });
            next.run(req).await
        }
        Ok(None) => {
            debug!(path = %req.uri().path(), "Unauthenticated request, redirecting to login");
            Redirect::to(LOGIN_REQUIRED_REDIRECT).into_response()
        }
        Err(e) => {
            error!("Failed to read session: {e}");
            HandlerError::internal("Session unavailable").into_response()
        }
    }
}
