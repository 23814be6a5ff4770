use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::model::user::User;
use crate::repository::user_repo::UserRepository;
use crate::util::error::ServiceError;
use crate::util::password::{PasswordUtils, PasswordUtilsImpl};

/// Credential store: registration and login checks.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Fails with [`ServiceError::DuplicateUser`] when the mobile number is taken.
    async fn register(&self, mobile: String, password: String) -> Result<User, ServiceError>;

    /// Unknown mobile and wrong password both fail with [`ServiceError::InvalidCredentials`].
    async fn authenticate(&self, mobile: String, password: String) -> Result<User, ServiceError>;
}

pub struct UserServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
}

impl UserServiceImpl {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, password), fields(mobile = %mobile))]
    async fn register(&self, mobile: String, password: String) -> Result<User, ServiceError> {
        info!("Registering new user");
        if self.user_repo.find_by_mobile(&mobile).await?.is_some() {
            warn!("Mobile number already registered");
            return Err(ServiceError::DuplicateUser);
        }
        let hash = PasswordUtilsImpl::hash_password(&password)
            .map_err(|e| ServiceError::Internal(format!("Password hash error: {}", e)))?;
        // the unique index turns a concurrent duplicate into DuplicateUser too
        let inserted = self.user_repo.insert(User::new(mobile, hash)).await;
        match &inserted {
            Ok(_) => info!("User registered successfully"),
            Err(e) => error!("Failed to insert user: {e}"),
        }
        Ok(inserted?)
    }

    #[instrument(skip(self, password), fields(mobile = %mobile))]
    async fn authenticate(&self, mobile: String, password: String) -> Result<User, ServiceError> {
        info!("User login attempt");
        let Some(user) = self.user_repo.find_by_mobile(&mobile).await? else {
            warn!("Login failed: unknown mobile");
            return Err(ServiceError::InvalidCredentials);
        };
        let valid = PasswordUtilsImpl::verify_password(&password, &user.password_hash)
            .map_err(|e| ServiceError::Internal(format!("Password verify error: {}", e)))?;
        if !valid {
            warn!("Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }
        info!("User logged in successfully");
        Ok(user)
    }
}
