pub mod cookie;
pub mod credentials;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::models::PublicUser;

pub use credentials::CredentialStore;
pub use extractors::AuthenticatedUser;
pub use middleware::AccessGate;
pub use token::{Claims, TokenService};

/// Represents the payload for a user login request.
/// Absent fields deserialize as empty strings and are reported together.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn check(&self) -> Result<(), AppError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(AppError::BadRequest(
                "Email and password are required".into(),
            ));
        }
        Ok(())
    }
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,
}

impl RegisterRequest {
    pub fn check(&self) -> Result<(), AppError> {
        if self.email.is_empty() || self.password.is_empty() || self.name.trim().is_empty() {
            return Err(AppError::BadRequest("Missing required fields".into()));
        }
        self.validate()?;
        Ok(())
    }
}

/// Body returned after a successful login or registration. The session token
/// itself travels only in the `token` cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
}
