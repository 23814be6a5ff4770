use serde::Deserialize;
use validator::Validate;

/// Form body shared by `/login` and `/register`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CredentialsForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "Mobile number is required"))]
    pub mobile: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Password is required"))]
    pub password: String,
}

/// Query string of `GET /login`; `required` is set by the auth guard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginPageQuery {
    pub required: Option<String>,
}
