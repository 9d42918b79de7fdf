//! Ticket storage mechanism.
//!
//! `TicketStore` owns the read, mutate, and conditional-write cycle on top of
//! [`TicketRepository`]. It enforces the aggregate's invariants but carries
//! no role policy; [`crate::domain::TicketServiceImpl`] decides who may call
//! what.
//!
//! Writers to the same ticket race on its revision. A writer that loses
//! re-reads the fresh ticket and replays its mutation, so concurrent
//! assignment and evidence uploads both land. After
//! [`MAX_WRITE_ATTEMPTS`] lost races the caller gets `conflict`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{TicketRepository, TicketRepositoryError};
use crate::domain::{
    Error, Evidence, EvidenceDraft, EvidenceId, NewTicket, TeamName, Ticket, TicketId,
    TicketMutationError, TicketStatus, UserId,
};

/// Attempts per mutation before giving up with `conflict`.
pub const MAX_WRITE_ATTEMPTS: u32 = 8;

/// Revision-checked ticket store.
pub struct TicketStore<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> Clone for TicketStore<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            clock: Arc::clone(&self.clock),
        }
    }
}

pub(crate) fn map_repository_error(error: TicketRepositoryError) -> Error {
    match error {
        TicketRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ticket repository unavailable: {message}"))
        }
        TicketRepositoryError::Query { message } => {
            Error::internal(format!("ticket repository error: {message}"))
        }
        TicketRepositoryError::Duplicate { ticket_id } => {
            Error::conflict("ticket already exists").with_details(json!({ "ticketId": ticket_id }))
        }
        TicketRepositoryError::Missing { ticket_id } => {
            Error::not_found("ticket not found").with_details(json!({ "ticketId": ticket_id }))
        }
        TicketRepositoryError::RevisionMismatch { expected, actual } => {
            Error::conflict("revision mismatch").with_details(json!({
                "expectedRevision": expected,
                "actualRevision": actual,
                "code": "revision_mismatch",
            }))
        }
    }
}

fn map_mutation_error(id: &TicketId, error: TicketMutationError) -> Error {
    let message = error.to_string();
    match error {
        TicketMutationError::InvalidTransition { from, to } => {
            Error::invalid_transition(message).with_details(json!({
                "ticketId": id.to_string(),
                "from": from.label(),
                "to": to.label(),
            }))
        }
        TicketMutationError::AssignmentClosed { status } => {
            Error::invalid_transition(message).with_details(json!({
                "ticketId": id.to_string(),
                "status": status.label(),
            }))
        }
        TicketMutationError::NotReporter => Error::forbidden(message),
        TicketMutationError::ForeignEvidence => Error::internal(message),
    }
}

fn ticket_not_found(id: &TicketId) -> Error {
    Error::not_found("ticket not found").with_details(json!({ "ticketId": id.to_string() }))
}

impl<R> TicketStore<R> {
    /// Create a store over `repo`, stamping writes with `clock`.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

impl<R> TicketStore<R>
where
    R: TicketRepository,
{
    /// Open and persist a new ticket in `Recibido`.
    pub async fn create(&self, new: NewTicket) -> Result<Ticket, Error> {
        let ticket = Ticket::open(TicketId::random(), new, self.clock.utc());
        self.repo
            .insert(&ticket)
            .await
            .map_err(map_repository_error)?;
        Ok(ticket)
    }

    /// Fetch a ticket; missing tickets are `not_found`.
    pub async fn get(&self, id: &TicketId) -> Result<Ticket, Error> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| ticket_not_found(id))
    }

    /// Every stored ticket, unordered.
    pub async fn list_all(&self) -> Result<Vec<Ticket>, Error> {
        self.repo.list_all().await.map_err(map_repository_error)
    }

    /// Tickets reported by `reporter`, unordered.
    pub async fn list_by_reporter(&self, reporter: &UserId) -> Result<Vec<Ticket>, Error> {
        self.repo
            .list_by_reporter(reporter)
            .await
            .map_err(map_repository_error)
    }

    /// Move a ticket to its next status.
    pub async fn set_status(&self, id: &TicketId, target: TicketStatus) -> Result<Ticket, Error> {
        self.mutate(id, |ticket, now| ticket.advance_to(target, now))
            .await
            .map(|(ticket, ())| ticket)
    }

    /// Route a ticket to `team`, moving `Recibido` tickets to `Asignado`.
    pub async fn set_assigned_team(&self, id: &TicketId, team: TeamName) -> Result<Ticket, Error> {
        self.mutate(id, |ticket, now| ticket.assign_team(team.clone(), now))
            .await
            .map(|(ticket, ())| ticket)
    }

    /// Attach evidence uploaded by `uploader`, who must be the reporter.
    pub async fn add_evidence(
        &self,
        id: &TicketId,
        uploader: &UserId,
        draft: EvidenceDraft,
    ) -> Result<Evidence, Error> {
        let evidence_id = EvidenceId::random();
        let (_, evidence) = self
            .mutate(id, |ticket, now| {
                let evidence = draft
                    .clone()
                    .into_evidence(evidence_id, *ticket.id(), *uploader, now);
                ticket.attach_evidence(evidence.clone(), now)?;
                Ok(evidence)
            })
            .await?;
        Ok(evidence)
    }

    async fn mutate<T, F>(&self, id: &TicketId, mut apply: F) -> Result<(Ticket, T), Error>
    where
        F: FnMut(&mut Ticket, DateTime<Utc>) -> Result<T, TicketMutationError> + Send,
        T: Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut ticket = self.get(id).await?;
            let expected = ticket.revision();
            let outcome =
                apply(&mut ticket, self.clock.utc()).map_err(|err| map_mutation_error(id, err))?;
            match self.repo.update(&ticket, expected).await {
                Ok(()) => return Ok((ticket, outcome)),
                Err(TicketRepositoryError::RevisionMismatch { expected, actual }) => {
                    debug!(
                        ticket_id = %id,
                        attempt,
                        expected,
                        actual,
                        "ticket write lost a revision race; retrying"
                    );
                }
                Err(TicketRepositoryError::Missing { .. }) => return Err(ticket_not_found(id)),
                Err(other) => return Err(map_repository_error(other)),
            }
        }
        let details = json!({
            "ticketId": id.to_string(),
            "attempts": MAX_WRITE_ATTEMPTS,
        });
        Err(Error::conflict("ticket is being modified concurrently; retry later")
            .with_details(details))
    }
}
