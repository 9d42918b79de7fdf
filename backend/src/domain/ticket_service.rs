//! Ticket use-cases.
//!
//! [`TicketServiceImpl`] implements the [`TicketCommand`] and [`TicketQuery`]
//! driving ports. It holds the role policy: citizens report incidents and
//! attach evidence to their own tickets, operators see everything and drive
//! the lifecycle.

use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::auth_service::map_user_error;
use crate::domain::ports::{
    CreateTicketRequest, TicketCommand, TicketQuery, TicketRepository, UserRepository,
};
use crate::domain::ticket_store::TicketStore;
use crate::domain::{
    Error, Evidence, EvidenceDraft, Identity, IncidentClassifier, NewTicket, Role, TeamName,
    Ticket, TicketId, TicketStatus,
};

/// Ticket service implementing the driving ports.
pub struct TicketServiceImpl<T, U> {
    store: TicketStore<T>,
    users: Arc<U>,
    classifier: Arc<dyn IncidentClassifier>,
}

impl<T, U> TicketServiceImpl<T, U> {
    /// Create a service over `store`, resolving reporters through `users`.
    pub fn new(
        store: TicketStore<T>,
        users: Arc<U>,
        classifier: Arc<dyn IncidentClassifier>,
    ) -> Self {
        Self {
            store,
            users,
            classifier,
        }
    }
}

fn require_role(caller: &Identity, role: Role, action: &str) -> Result<(), Error> {
    if caller.role == role {
        Ok(())
    } else {
        Err(Error::forbidden(format!("only {role} accounts may {action}")))
    }
}

#[async_trait]
impl<T, U> TicketCommand for TicketServiceImpl<T, U>
where
    T: TicketRepository,
    U: UserRepository,
{
    async fn create_ticket(
        &self,
        caller: &Identity,
        request: CreateTicketRequest,
    ) -> Result<Ticket, Error> {
        require_role(caller, Role::Citizen, "report incidents")?;
        let reporter = self
            .users
            .find_by_id(&caller.user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("account no longer exists"))?;

        let classification = self
            .classifier
            .classify(request.description.as_str(), request.category_hint.as_deref());
        let ticket = self
            .store
            .create(NewTicket {
                title: request.title,
                description: request.description,
                classification,
                reporter: *reporter.id(),
                reporter_name: reporter.name().clone(),
                reporter_email: reporter.email().clone(),
            })
            .await?;
        info!(
            ticket_id = %ticket.id(),
            category = ticket.category().slug(),
            priority = ticket.priority().value(),
            "ticket opened"
        );
        Ok(ticket)
    }

    async fn assign_team(
        &self,
        caller: &Identity,
        ticket_id: &TicketId,
        team: TeamName,
    ) -> Result<Ticket, Error> {
        require_role(caller, Role::Operator, "assign teams")?;
        let ticket = self.store.set_assigned_team(ticket_id, team).await?;
        info!(ticket_id = %ticket_id, status = ticket.status().slug(), "ticket assigned");
        Ok(ticket)
    }

    async fn advance_status(
        &self,
        caller: &Identity,
        ticket_id: &TicketId,
        target: TicketStatus,
    ) -> Result<Ticket, Error> {
        require_role(caller, Role::Operator, "change ticket status")?;
        let ticket = self.store.set_status(ticket_id, target).await?;
        info!(ticket_id = %ticket_id, status = target.slug(), "ticket status changed");
        Ok(ticket)
    }

    async fn add_evidence(
        &self,
        caller: &Identity,
        ticket_id: &TicketId,
        draft: EvidenceDraft,
    ) -> Result<Evidence, Error> {
        self.store.add_evidence(ticket_id, &caller.user_id, draft).await
    }
}

#[async_trait]
impl<T, U> TicketQuery for TicketServiceImpl<T, U>
where
    T: TicketRepository,
    U: UserRepository,
{
    async fn list_mine(&self, caller: &Identity) -> Result<Vec<Ticket>, Error> {
        let mut tickets = self.store.list_by_reporter(&caller.user_id).await?;
        tickets.sort_by_key(|ticket| (Reverse(ticket.created_at()), *ticket.id().as_uuid()));
        Ok(tickets)
    }

    async fn list_all(&self, caller: &Identity) -> Result<Vec<Ticket>, Error> {
        require_role(caller, Role::Operator, "list all tickets")?;
        let mut tickets = self.store.list_all().await?;
        tickets.sort_by_key(|ticket| {
            (
                Reverse(ticket.priority()),
                ticket.created_at(),
                *ticket.id().as_uuid(),
            )
        });
        Ok(tickets)
    }
}

#[cfg(test)]
#[path = "ticket_service_tests.rs"]
mod tests;
