//! Account registration and session authentication service.
//!
//! Implements [`AuthService`] over a [`UserRepository`], a
//! [`PasswordHasher`], and a [`SessionTokens`] codec. Password work runs on
//! tokio's blocking pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use serde_json::json;
use tokio::sync::OnceCell;
use zeroize::Zeroizing;

use crate::domain::ports::{
    AuthService, PasswordHashError, PasswordHasher, SessionTokens, UserPersistenceError,
    UserRepository,
};
use crate::domain::{
    EmailAddress, Error, Identity, LoginCredentials, LoginOutcome, PasswordHash, Registration,
    SessionClaims, User, UserId, UserProfile,
};

/// Default lifetime of issued session tokens.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { email } => {
            Error::conflict("email already registered").with_details(json!({
                "field": "email",
                "value": email,
                "code": "duplicate_email",
            }))
        }
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

/// [`AuthService`] implementation.
pub struct AuthServiceImpl<U> {
    users: Arc<U>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn SessionTokens>,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
    decoy: OnceCell<PasswordHash>,
}

impl<U> AuthServiceImpl<U> {
    /// Wire the service; tokens live for [`DEFAULT_TOKEN_TTL_MINUTES`].
    pub fn new(
        users: Arc<U>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn SessionTokens>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
            token_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            decoy: OnceCell::new(),
        }
    }

    /// Override the token lifetime.
    #[must_use]
    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    async fn hash_password(&self, password: Zeroizing<String>) -> Result<PasswordHash, Error> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(password.as_str()))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(map_hash_error)
    }

    async fn verify_password(
        &self,
        password: Zeroizing<String>,
        hash: PasswordHash,
    ) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(password.as_str(), &hash))
            .await
            .map_err(|err| Error::internal(format!("password verification task failed: {err}")))?
            .map_err(map_hash_error)
    }

    /// Hash compared against when the email is unknown, so both failure
    /// paths cost one verification.
    async fn decoy_hash(&self) -> Result<PasswordHash, Error> {
        self.decoy
            .get_or_try_init(|| self.hash_password(Zeroizing::new(DECOY_PASSWORD.to_owned())))
            .await
            .cloned()
    }
}

impl<U> AuthServiceImpl<U>
where
    U: UserRepository,
{
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.users.find_by_id(id).await.map_err(map_user_error)
    }
}

#[async_trait]
impl<U> AuthService for AuthServiceImpl<U>
where
    U: UserRepository,
{
    async fn register(&self, registration: Registration) -> Result<UserProfile, Error> {
        let hash = self
            .hash_password(Zeroizing::new(registration.password().to_owned()))
            .await?;
        let user = User::new(
            UserId::random(),
            registration.name().clone(),
            registration.email().clone(),
            hash,
            registration.role(),
            self.clock.utc(),
        );
        self.users.insert(&user).await.map_err(map_user_error)?;
        Ok(user.profile())
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<LoginOutcome, Error> {
        let user = match EmailAddress::new(credentials.email()) {
            Ok(email) => self.users.find_by_email(&email).await.map_err(map_user_error)?,
            Err(_) => None,
        };
        let hash = match &user {
            Some(user) => user.password_hash().clone(),
            None => self.decoy_hash().await?,
        };
        let matches = self
            .verify_password(Zeroizing::new(credentials.password().to_owned()), hash)
            .await?;
        let user = match user {
            Some(user) if matches => user,
            _ => return Err(invalid_credentials()),
        };

        let issued_at = self.clock.utc();
        let claims = SessionClaims {
            subject: *user.id(),
            role: user.role(),
            issued_at,
            expires_at: issued_at + self.token_ttl,
        };
        let token = self
            .tokens
            .issue(&claims)
            .map_err(|err| Error::internal(err.to_string()))?;
        Ok(LoginOutcome {
            token,
            expires_at: claims.expires_at,
            profile: user.profile(),
        })
    }

    async fn authenticate(&self, token: &str) -> Result<Identity, Error> {
        self.tokens
            .verify(token, self.clock.utc())
            .map(|claims| claims.identity())
            .map_err(|_| Error::unauthorized("invalid or expired session"))
    }

    async fn current_user(&self, identity: &Identity) -> Result<UserProfile, Error> {
        self.find_user(&identity.user_id)
            .await?
            .map(|user| user.profile())
            .ok_or_else(|| Error::unauthorized("account no longer exists"))
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;
