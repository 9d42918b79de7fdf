//! Authentication primitives: registration input, login credentials, session
//! claims, and the resolved caller identity.
//!
//! Inbound adapters build these from raw strings before talking to a port, so
//! services only ever see validated values.

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::domain::user::{EmailAddress, Role, UserId, UserName, UserProfile, UserValidationError};

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN: usize = 8;
/// Maximum password length accepted at registration.
pub const PASSWORD_MAX: usize = 128;

/// Errors returned when registration input is invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationValidationError {
    /// Name, email, or role failed validation.
    #[error(transparent)]
    Account(#[from] UserValidationError),
    /// Password shorter than [`PASSWORD_MIN`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    /// Password longer than [`PASSWORD_MAX`].
    #[error("password must be at most {max} characters")]
    PasswordTooLong { max: usize },
}

impl RegistrationValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Account(
                UserValidationError::EmptyName | UserValidationError::NameTooLong { .. },
            ) => {
                "name"
            }
            Self::Account(UserValidationError::UnknownRole { .. }) => "role",
            Self::Account(_) => "email",
            Self::PasswordTooShort { .. } | Self::PasswordTooLong { .. } => "password",
        }
    }
}

/// Validated registration request.
///
/// ## Invariants
/// - `email` is normalised (see [`EmailAddress`]).
/// - `password` holds between [`PASSWORD_MIN`] and [`PASSWORD_MAX`] characters
///   and is wiped from memory on drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    name: UserName,
    email: EmailAddress,
    password: Zeroizing<String>,
    role: Role,
}

impl Registration {
    /// Validate raw registration inputs.
    ///
    /// # Examples
    /// ```
    /// use vita_backend::domain::{Registration, Role};
    ///
    /// let reg =
    ///     Registration::try_from_parts("Ana", "ana@municipio.cl", "s3cret-pass", "ciudadano")
    ///         .unwrap();
    /// assert_eq!(reg.role(), Role::Citizen);
    /// ```
    pub fn try_from_parts(
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<Self, RegistrationValidationError> {
        let name = UserName::new(name)?;
        let email = EmailAddress::new(email)?;
        let length = password.chars().count();
        if length < PASSWORD_MIN {
            return Err(RegistrationValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        if length > PASSWORD_MAX {
            return Err(RegistrationValidationError::PasswordTooLong { max: PASSWORD_MAX });
        }
        let role = role.parse::<Role>()?;
        Ok(Self {
            name,
            email,
            password: Zeroizing::new(password.to_owned()),
            role,
        })
    }

    /// Requested display name.
    pub fn name(&self) -> &UserName {
        &self.name
    }

    /// Normalised login email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Plaintext password.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Requested role.
    pub fn role(&self) -> Role {
        self.role
    }
}

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Login credentials as typed by the caller.
///
/// The email is trimmed and lower-cased but not otherwise validated, so an
/// unknown or malformed address fails the same way as a wrong password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalised = email.trim().to_lowercase();
        if normalised.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email: normalised,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for the account lookup.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Caller resolved from a verified session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Account the token was issued to.
    pub user_id: UserId,
    /// Role captured at login.
    pub role: Role,
}

impl Identity {
    /// Whether the caller holds the operator role.
    pub fn is_operator(&self) -> bool {
        self.role == Role::Operator
    }
}

/// Signed content of a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClaims {
    /// Account the token was issued to.
    pub subject: UserId,
    /// Role captured at login.
    pub role: Role,
    /// Issue instant.
    pub issued_at: DateTime<Utc>,
    /// Instant after which the token must be refused.
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Whether the claims are no longer valid at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Identity carried by these claims.
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.subject,
            role: self.role,
        }
    }
}

/// Opaque bearer token handed to clients.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(Zeroizing<String>);

impl SessionToken {
    /// Wrap an encoded token.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(Zeroizing::new(encoded.into()))
    }

    /// Borrow the encoded token.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Bearer token for subsequent requests.
    pub token: SessionToken,
    /// Expiry instant of `token`.
    pub expires_at: DateTime<Utc>,
    /// Account that logged in.
    pub profile: UserProfile,
}
