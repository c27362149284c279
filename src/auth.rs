use crate::client::{ApiClient, ApiError};
use crate::storage::LocalStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Caught client-side; no request is issued.
    #[error("{0}")]
    Validation(String),

    /// Backend-reported business errors pass through verbatim.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), AuthError> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub company_name: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.name.trim().is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        if self.company_name.trim().is_empty() {
            return Err(AuthError::Validation("Company name is required".to_string()));
        }
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(AuthError::Validation(
            "Enter a valid email address".to_string(),
        ))
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < 8 {
        Err(AuthError::Validation(
            "Password must be at least 8 characters".to_string(),
        ))
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    user: Value,
}

/// Log in and persist the token and user record for later requests.
pub async fn login(
    client: &ApiClient,
    store: &Mutex<LocalStore>,
    credentials: &Credentials,
) -> Result<(), AuthError> {
    credentials.validate()?;
    let response: LoginResponse = client.post("/auth/login", credentials).await?;

    let mut store = store.lock().expect("store mutex poisoned");
    store.set_access_token(&response.access_token)?;
    if !response.user.is_null() {
        store.set_user(&response.user)?;
    }
    Ok(())
}

/// Create an account. The backend's `{message}` is the error surface.
pub async fn signup(client: &ApiClient, form: &SignupForm) -> Result<(), AuthError> {
    form.validate()?;
    let _: Value = client.post("/auth/signup", form).await?;
    Ok(())
}
