//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports ([`AuthService`], [`TicketCommand`], [`TicketQuery`]) are
//! implemented by domain services and called by inbound adapters. Driven
//! ports are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_service;
mod password_hasher;
mod session_tokens;
mod ticket_command;
mod ticket_query;
mod ticket_repository;
mod user_repository;

#[cfg(test)]
pub use auth_service::MockAuthService;
pub use auth_service::AuthService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use session_tokens::MockSessionTokens;
pub use session_tokens::{SessionTokenError, SessionTokens};
#[cfg(test)]
pub use ticket_command::MockTicketCommand;
pub use ticket_command::{CreateTicketRequest, TicketCommand};
#[cfg(test)]
pub use ticket_query::MockTicketQuery;
pub use ticket_query::TicketQuery;
#[cfg(test)]
pub use ticket_repository::MockTicketRepository;
pub use ticket_repository::{TicketRepository, TicketRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
