//! Port for one-way password hashing.

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        /// The hasher could not produce or parse a hash.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Salted, slow password hashing.
///
/// Methods are synchronous and CPU bound; async callers should move them
/// onto a blocking thread.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` with a fresh salt.
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError>;

    /// Check `password` against `hash` in constant time.
    ///
    /// A mismatch is `Ok(false)`; errors are reserved for unreadable hashes.
    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError>;
}
