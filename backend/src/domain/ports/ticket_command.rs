//! Driving port for ticket mutations.

use async_trait::async_trait;

use crate::domain::{
    Error, Evidence, EvidenceDraft, Identity, TeamName, Ticket, TicketDescription, TicketId,
    TicketStatus, TicketTitle,
};

/// Validated input for [`TicketCommand::create_ticket`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTicketRequest {
    /// Short headline.
    pub title: TicketTitle,
    /// What the citizen observed.
    pub description: TicketDescription,
    /// Optional category label or slug suggested by the client.
    pub category_hint: Option<String>,
}

/// Ticket mutations. Every method checks the caller's role first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketCommand: Send + Sync {
    /// Citizens report an incident; the ticket starts as `Recibido`.
    async fn create_ticket(
        &self,
        caller: &Identity,
        request: CreateTicketRequest,
    ) -> Result<Ticket, Error>;

    /// Operators route a ticket to a team.
    async fn assign_team(
        &self,
        caller: &Identity,
        ticket_id: &TicketId,
        team: TeamName,
    ) -> Result<Ticket, Error>;

    /// Operators move a ticket to its next status.
    async fn advance_status(
        &self,
        caller: &Identity,
        ticket_id: &TicketId,
        target: TicketStatus,
    ) -> Result<Ticket, Error>;

    /// The reporter attaches supporting evidence.
    async fn add_evidence(
        &self,
        caller: &Identity,
        ticket_id: &TicketId,
        draft: EvidenceDraft,
    ) -> Result<Evidence, Error>;
}
