use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::handler::user_handler::{login_handler, login_page, logout_handler, register_handler, register_page};
use crate::middlewares::auth_middleware::require_auth;
use crate::service::user_service::UserServiceImpl;

pub fn user_router(service: Arc<UserServiceImpl>) -> Router {
    let public = Router::new()
        .route("/login", get(login_page).post(login_handler))
        .route("/register", get(register_page).post(register_handler));

    let protected = Router::new()
        .route("/logout", get(logout_handler))
        .route_layer(middleware::from_fn(require_auth));

    public.merge(protected).with_state(service)
}
