//! Port for ticket persistence.
//!
//! Adapters store the whole aggregate, evidence included, and guard updates
//! with the ticket revision so concurrent writers cannot overwrite each
//! other.

use async_trait::async_trait;

use crate::domain::{Ticket, TicketId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ticket repository adapters.
    pub enum TicketRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "ticket repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "ticket repository query failed: {message}",
        /// A ticket with this id already exists.
        Duplicate { ticket_id: String } =>
            "ticket already exists: {ticket_id}",
        /// The ticket to update does not exist.
        Missing { ticket_id: String } =>
            "ticket not found: {ticket_id}",
        /// Optimistic concurrency check failed.
        RevisionMismatch { expected: u32, actual: u32 } =>
            "revision mismatch: expected {expected}, found {actual}",
    }
}

/// Port for ticket storage and retrieval.
///
/// # Revision Semantics
///
/// - New tickets are inserted at revision 1.
/// - Callers mutate a copy, which bumps its revision, then call
///   [`TicketRepository::update`] with the revision they read.
/// - The update succeeds only if the stored revision still equals
///   `expected_revision`; otherwise
///   [`TicketRepositoryError::RevisionMismatch`] is returned and nothing is
///   written.
/// - Writes to different tickets never contend with each other.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Persist a freshly opened ticket.
    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError>;

    /// Fetch a ticket and its evidence.
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError>;

    /// Every ticket, in no particular order.
    async fn list_all(&self) -> Result<Vec<Ticket>, TicketRepositoryError>;

    /// Tickets reported by `reporter`, in no particular order.
    async fn list_by_reporter(
        &self,
        reporter: &UserId,
    ) -> Result<Vec<Ticket>, TicketRepositoryError>;

    /// Replace the stored ticket if its revision still equals
    /// `expected_revision`.
    async fn update(
        &self,
        ticket: &Ticket,
        expected_revision: u32,
    ) -> Result<(), TicketRepositoryError>;
}
