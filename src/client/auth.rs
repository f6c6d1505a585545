//! Access control for the upload flow, backed by an external identity service.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

pub const UPLOAD_PATH: &str = "/upload";
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl AuthUser {
    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("User")
    }
}

/// Failure reported by the identity service, e.g. `auth/wrong-password`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Message suitable for a notification.
    pub fn friendly_message(&self) -> String {
        let known = match self.code.as_str() {
            "auth/user-not-found" => "No account found with this email address.",
            "auth/wrong-password" => "Incorrect password. Please try again.",
            "auth/too-many-requests" => "Too many failed attempts. Please try again later.",
            "auth/invalid-email" => "Invalid email address format.",
            "auth/user-disabled" => "This account has been disabled.",
            "auth/email-already-in-use" => "An account with this email already exists.",
            "auth/weak-password" => "Password is too weak. Please choose a stronger password.",
            "auth/operation-not-allowed" => "Email/password accounts are not enabled.",
            _ => return self.message.clone(),
        };
        known.to_string()
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::auth(format!("❌ {}", err.friendly_message()))
    }
}

/// Email/password identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ProviderError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, ProviderError>;

    async fn update_display_name(&self, user: &AuthUser, name: &str) -> Result<AuthUser, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// Validates credentials, calls the provider and publishes auth-state changes.
pub struct AuthGate {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<Option<AuthUser>>,
}

impl AuthGate {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(None);
        Self { provider, state }
    }

    /// Receives the current user on every sign-in, sign-up or sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().clone()
    }

    /// Gate for the upload flow.
    pub fn require_user(&self) -> AppResult<AuthUser> {
        self.current_user().ok_or(AppError::Unauthenticated)
    }

    /// Returns the path to continue to on success.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<&'static str> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Please fill in all fields"));
        }
        validate_email(email)?;

        let user = self.provider.sign_in(email, password).await.map_err(|e| {
            warn!(code = %e.code, "Sign-in rejected");
            AppError::from(e)
        })?;

        info!(user = %user.greeting_name(), "User signed in");
        self.publish(Some(user));
        Ok(UPLOAD_PATH)
    }

    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> AppResult<&'static str> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Please fill in all fields"));
        }
        if name.chars().count() < MIN_NAME_LEN {
            return Err(AppError::validation("Name must be at least 2 characters long"));
        }
        validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(
                "Password must be at least 6 characters long",
            ));
        }

        let user = self.provider.sign_up(email, password).await.map_err(|e| {
            warn!(code = %e.code, "Sign-up rejected");
            AppError::from(e)
        })?;
        let user = self.provider.update_display_name(&user, name).await?;

        info!(user = %user.greeting_name(), "Account created");
        self.publish(Some(user));
        Ok(UPLOAD_PATH)
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        self.provider
            .sign_out()
            .await
            .map_err(|_| AppError::auth("❌ Error logging out"))?;
        info!("User signed out");
        self.publish(None);
        Ok(())
    }

    fn publish(&self, user: Option<AuthUser>) {
        self.state.send_replace(user);
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

fn validate_email(email: &str) -> AppResult<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AppError::validation("Please enter a valid email address"))
    }
}
