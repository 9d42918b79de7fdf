//! In-memory `TicketRepository`.
//!
//! Each ticket sits behind its own mutex, so writers to different tickets
//! never wait on each other. The outer map lock is held only long enough to
//! find or insert an entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::domain::ports::{TicketRepository, TicketRepositoryError};
use crate::domain::{Ticket, TicketId, UserId};

type Slot = Arc<Mutex<Ticket>>;

/// Revision-checked ticket store held in process memory.
#[derive(Default)]
pub struct InMemoryTicketRepository {
    tickets: RwLock<HashMap<TicketId, Slot>>,
}

impl InMemoryTicketRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: &TicketId) -> Result<Option<Slot>, TicketRepositoryError> {
        let tickets = self.tickets.read().map_err(|_| poisoned())?;
        Ok(tickets.get(id).cloned())
    }

    fn snapshot(&self) -> Result<Vec<Slot>, TicketRepositoryError> {
        let tickets = self.tickets.read().map_err(|_| poisoned())?;
        Ok(tickets.values().cloned().collect())
    }
}

fn poisoned() -> TicketRepositoryError {
    TicketRepositoryError::query("ticket store lock poisoned")
}

fn read(slot: &Slot) -> Result<Ticket, TicketRepositoryError> {
    slot.lock().map(|ticket| ticket.clone()).map_err(|_| poisoned())
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let mut tickets = self.tickets.write().map_err(|_| poisoned())?;
        if tickets.contains_key(ticket.id()) {
            return Err(TicketRepositoryError::duplicate(ticket.id().to_string()));
        }
        tickets.insert(*ticket.id(), Arc::new(Mutex::new(ticket.clone())));
        Ok(())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError> {
        self.slot(id)?.as_ref().map(read).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Ticket>, TicketRepositoryError> {
        self.snapshot()?.iter().map(read).collect()
    }

    async fn list_by_reporter(
        &self,
        reporter: &UserId,
    ) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let mut mine = Vec::new();
        for slot in self.snapshot()? {
            let ticket = read(&slot)?;
            if ticket.is_reported_by(reporter) {
                mine.push(ticket);
            }
        }
        Ok(mine)
    }

    async fn update(
        &self,
        ticket: &Ticket,
        expected_revision: u32,
    ) -> Result<(), TicketRepositoryError> {
        let slot = self
            .slot(ticket.id())?
            .ok_or_else(|| TicketRepositoryError::missing(ticket.id().to_string()))?;
        let mut stored = slot.lock().map_err(|_| poisoned())?;
        if stored.revision() != expected_revision {
            return Err(TicketRepositoryError::revision_mismatch(
                expected_revision,
                stored.revision(),
            ));
        }
        *stored = ticket.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{
        Category, Classification, EmailAddress, NewTicket, TeamName, TicketDescription,
        TicketTitle, UserName,
    };
    use chrono::Utc;
    use rstest::{fixture, rstest};

    #[fixture]
    fn ticket() -> Ticket {
        Ticket::open(
            TicketId::random(),
            NewTicket {
                title: TicketTitle::new("Hoyo").expect("valid"),
                description: TicketDescription::new("Hoyo en la vereda").expect("valid"),
                classification: Classification {
                    category: Category::Infrastructure,
                    priority: Category::Infrastructure.base_priority(),
                },
                reporter: UserId::random(),
                reporter_name: UserName::new("Ana").expect("valid"),
                reporter_email: EmailAddress::new("ana@municipio.cl").expect("valid"),
            },
            Utc::now(),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn stale_revision_is_rejected(ticket: Ticket) {
        let repo = InMemoryTicketRepository::new();
        repo.insert(&ticket).await.expect("insert");

        let mut first = ticket.clone();
        first
            .assign_team(TeamName::new("Norte").expect("valid"), Utc::now())
            .expect("assign");
        repo.update(&first, 1).await.expect("first writer wins");

        let mut second = ticket.clone();
        second
            .assign_team(TeamName::new("Sur").expect("valid"), Utc::now())
            .expect("assign");
        let err = repo.update(&second, 1).await.expect_err("stale write");

        assert_eq!(err, TicketRepositoryError::revision_mismatch(1_u32, 2_u32));
        let stored = repo.find_by_id(ticket.id()).await.expect("lookup").expect("present");
        assert_eq!(stored.assigned_team().map(TeamName::as_str), Some("Norte"));
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_insert_is_rejected(ticket: Ticket) {
        let repo = InMemoryTicketRepository::new();
        repo.insert(&ticket).await.expect("insert");
        assert!(matches!(
            repo.insert(&ticket).await,
            Err(TicketRepositoryError::Duplicate { .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn updating_unknown_ticket_is_missing(ticket: Ticket) {
        let repo = InMemoryTicketRepository::new();
        assert!(matches!(
            repo.update(&ticket, 1).await,
            Err(TicketRepositoryError::Missing { .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn list_by_reporter_filters(ticket: Ticket) {
        let repo = InMemoryTicketRepository::new();
        repo.insert(&ticket).await.expect("insert");

        let mine = repo.list_by_reporter(ticket.reported_by()).await.expect("list");
        let theirs = repo.list_by_reporter(&UserId::random()).await.expect("list");

        assert_eq!(mine.len(), 1);
        assert!(theirs.is_empty());
    }
}
