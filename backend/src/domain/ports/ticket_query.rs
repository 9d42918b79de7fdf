//! Driving port for ticket reads.

use async_trait::async_trait;

use crate::domain::{Error, Identity, Ticket};

/// Ticket listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketQuery: Send + Sync {
    /// Tickets reported by the caller, newest first.
    async fn list_mine(&self, caller: &Identity) -> Result<Vec<Ticket>, Error>;

    /// Every ticket, highest priority first. Operators only.
    async fn list_all(&self, caller: &Identity) -> Result<Vec<Ticket>, Error>;
}
