//! Process-local repositories.
//!
//! Used when no database is configured and by integration tests. State is
//! lost on restart.

mod ticket_repository;
mod user_repository;

pub use ticket_repository::InMemoryTicketRepository;
pub use user_repository::InMemoryUserRepository;
