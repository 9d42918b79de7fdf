//! Port for issuing and verifying bearer session tokens.

use chrono::{DateTime, Utc};

use crate::domain::{SessionClaims, SessionToken};

use super::define_port_error;

define_port_error! {
    /// Token failures. Callers collapse all of them into `unauthorized`.
    pub enum SessionTokenError {
        /// The token did not have the expected shape.
        Malformed => "session token is malformed",
        /// The signature did not match.
        BadSignature => "session token signature is invalid",
        /// The token is past its expiry.
        Expired => "session token has expired",
        /// Signing failed.
        Signing { message: String } => "session token signing failed: {message}",
    }
}

/// Tamper-evident token codec.
#[cfg_attr(test, mockall::automock)]
pub trait SessionTokens: Send + Sync {
    /// Encode and sign `claims`.
    fn issue(&self, claims: &SessionClaims) -> Result<SessionToken, SessionTokenError>;

    /// Check the signature, then the expiry against `now`, and return the
    /// claims.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionTokenError>;
}
