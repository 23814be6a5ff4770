use askama::Template;
use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{info, warn};
use validator::Validate;

use crate::dto::user_dto::{CredentialsForm, LoginPageQuery};
use crate::handler::{page_flashes, render, session_error};
use crate::middlewares::auth_middleware::LOGIN_REQUIRED_MESSAGE;
use crate::service::user_service::{UserService, UserServiceImpl};
use crate::util::error::{HandlerError, ServiceError};
use crate::util::session::{end_session, push_flash, start_session, Flash, FlashCategory};

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful!";
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid mobile number or password.";
pub const REGISTER_SUCCESS_MESSAGE: &str = "Registration successful! Please log in.";
pub const REGISTER_DUPLICATE_MESSAGE: &str = "Mobile number already registered.";
pub const REGISTER_INVALID_MESSAGE: &str = "Mobile number and password are required.";
pub const LOGOUT_MESSAGE: &str = "Logged out successfully!";

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub flashes: Vec<Flash>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub flashes: Vec<Flash>,
}

async fn flash_and_redirect(session: &Session, category: FlashCategory, message: &str, to: &str) -> Result<Response, HandlerError> {
    push_flash(session, category, message).await.map_err(session_error)?;
    Ok(Redirect::to(to).into_response())
}

// GET /login
pub async fn login_page(session: Session, Query(query): Query<LoginPageQuery>) -> Result<impl IntoResponse, HandlerError> {
    let mut flashes = page_flashes(&session).await;
    if query.required.is_some() {
        flashes.push(Flash {
            category: FlashCategory::Danger,
            message: LOGIN_REQUIRED_MESSAGE.to_string(),
        });
    }
    render(&LoginTemplate { flashes })
}

// POST /login
pub async fn login_handler(
    State(service): State<Arc<UserServiceImpl>>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, HandlerError> {
    if form.validate().is_err() {
        return flash_and_redirect(&session, FlashCategory::Danger, LOGIN_FAILED_MESSAGE, "/login").await;
    }
    match service.authenticate(form.mobile, form.password).await {
        Ok(user) => {
            let user_id = user
                .id_hex()
                .ok_or_else(|| HandlerError::internal("Stored user has no id"))?;
            start_session(&session, &user_id).await.map_err(session_error)?;
            info!(user_id = %user_id, "Session started");
            flash_and_redirect(&session, FlashCategory::Success, LOGIN_SUCCESS_MESSAGE, "/billing").await
        }
        Err(ServiceError::InvalidCredentials) => {
            flash_and_redirect(&session, FlashCategory::Danger, LOGIN_FAILED_MESSAGE, "/login").await
        }
        Err(e) => Err(e.into()),
    }
}

// GET /register
pub async fn register_page(session: Session) -> Result<impl IntoResponse, HandlerError> {
    render(&RegisterTemplate {
        flashes: page_flashes(&session).await,
    })
}

// POST /register
pub async fn register_handler(
    State(service): State<Arc<UserServiceImpl>>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, HandlerError> {
    if let Err(e) = form.validate() {
        warn!("Registration form rejected: {e}");
        return flash_and_redirect(&session, FlashCategory::Danger, REGISTER_INVALID_MESSAGE, "/register").await;
    }
    match service.register(form.mobile, form.password).await {
        Ok(_) => flash_and_redirect(&session, FlashCategory::Success, REGISTER_SUCCESS_MESSAGE, "/login").await,
        Err(ServiceError::DuplicateUser) => {
            flash_and_redirect(&session, FlashCategory::Danger, REGISTER_DUPLICATE_MESSAGE, "/register").await
        }
        Err(e) => Err(e.into()),
    }
}

// GET /logout
pub async fn logout_handler(session: Session) -> Result<Response, HandlerError> {
    end_session(&session).await.map_err(session_error)?;
    flash_and_redirect(&session, FlashCategory::Success, LOGOUT_MESSAGE, "/login").await
}
