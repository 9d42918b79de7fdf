//! Domain entities, policies, and services.
//!
//! Everything here is transport and storage agnostic; adapters reach the
//! outside world through [`ports`].

pub mod auth;
pub mod auth_service;
pub mod classifier;
pub mod error;
pub mod ports;
pub mod ticket;
pub mod ticket_service;
pub mod ticket_store;
pub mod trace_id;
pub mod user;

pub use self::auth::{
    Identity, LoginCredentials, LoginOutcome, LoginValidationError, PASSWORD_MAX, PASSWORD_MIN,
    Registration, RegistrationValidationError, SessionClaims, SessionToken,
};
pub use self::auth_service::{AuthServiceImpl, DEFAULT_TOKEN_TTL_MINUTES};
pub use self::classifier::{
    Category, Classification, IncidentClassifier, KeywordClassifier, Priority, PriorityOutOfRange,
    UrgencyLevel,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ticket::{
    Evidence, EvidenceDraft, EvidenceId, EvidenceValidationError, MAX_EVIDENCE_DESCRIPTION,
    MAX_IMAGE_REFERENCE_BYTES, NewTicket, TITLE_MAX, TeamName, Ticket, TicketDescription,
    TicketId, TicketMutationError, TicketSnapshot, TicketStatus, TicketTitle,
    TicketValidationError, UnknownStatus,
};
pub use self::ticket_service::TicketServiceImpl;
pub use self::ticket_store::{MAX_WRITE_ATTEMPTS, TicketStore};
pub use self::trace_id::TraceId;
pub use self::user::{
    EmailAddress, PasswordHash, Role, User, UserId, UserName, UserProfile, UserValidationError,
};
