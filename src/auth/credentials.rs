use std::sync::Arc;

use uuid::Uuid;

use crate::auth::password;
use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::store::UserStore;

/// Account creation and password checks on top of a `UserStore`.
///
/// bcrypt work runs on the blocking thread pool so a slow hash never stalls
/// the actix worker that is driving other requests.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    cost: u32,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>, cost: u32) -> Self {
        Self { users, cost }
    }

    /// Registers a new account. Fails with `AppError::Conflict` if the email
    /// is taken.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AppError> {
        if self.users.find_user_by_email(email).await?.is_some() {
            return Err(AppError::Conflict(crate::store::DUPLICATE_EMAIL.into()));
        }

        let cost = self.cost;
        let plaintext = password.to_string();
        let password_hash =
            tokio::task::spawn_blocking(move || password::hash_password(&plaintext, cost))
                .await??;

        let user = self
            .users
            .create_user(NewUser {
                email: email.to_string(),
                name: name.to_string(),
                password_hash,
            })
            .await?;

        log::info!("registered user {}", user.id);
        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.users.find_user_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.users.find_user_by_id(id).await
    }

    pub async fn verify_password(&self, plaintext: &str, hash: &str) -> Result<bool, AppError> {
        let plaintext = plaintext.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || password::verify_password(&plaintext, &hash)).await?
    }

    /// Looks the user up by email and checks the password. `None` covers both
    /// an unknown email and a wrong password.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, AppError> {
        let Some(user) = self.get_user_by_email(email).await? else {
            return Ok(None);
        };

        if self.verify_password(password, &user.password_hash).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}
