//! Credential adapters: password hashing and session token signing.

mod argon2_password_hasher;
mod hmac_session_tokens;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use hmac_session_tokens::{HmacSessionTokens, MIN_SECRET_LEN};
