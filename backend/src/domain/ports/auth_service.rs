//! Driving port for account registration and session authentication.
//!
//! Inbound adapters call it without knowing which hasher, token codec, or
//! store sits behind it, so handler tests can substitute a double.

use async_trait::async_trait;

use crate::domain::{Error, Identity, LoginCredentials, LoginOutcome, Registration, UserProfile};

/// Account and session use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account; fails with `conflict` when the email is taken.
    async fn register(&self, registration: Registration) -> Result<UserProfile, Error>;

    /// Exchange credentials for a session token.
    ///
    /// Unknown emails and wrong passwords fail identically with
    /// `unauthorized`.
    async fn login(&self, credentials: LoginCredentials) -> Result<LoginOutcome, Error>;

    /// Resolve a bearer token to the caller's identity.
    async fn authenticate(&self, token: &str) -> Result<Identity, Error>;

    /// Profile of an authenticated caller.
    async fn current_user(&self, identity: &Identity) -> Result<UserProfile, Error>;
}
