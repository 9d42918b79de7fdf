//! PostgreSQL-backed `TicketRepository` implementation using Diesel ORM.
//!
//! A ticket spans the `tickets` row and its `ticket_evidence` rows. Updates
//! run in one transaction guarded by `revision`; evidence is append-only, so
//! only rows whose id is not yet stored get inserted.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{TicketRepository, TicketRepositoryError};
use crate::domain::{
    Category, Evidence, EvidenceId, Priority, Ticket, TicketId, TicketSnapshot, TicketStatus,
    UserId,
};

use super::diesel_error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{EvidenceRow, NewTicketRow, TicketRow, TicketUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{ticket_evidence, tickets};

/// Diesel-backed implementation of the `TicketRepository` port.
#[derive(Clone)]
pub struct DieselTicketRepository {
    pool: DbPool,
}

impl DieselTicketRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a write transaction.
enum WriteError {
    Diesel(diesel::result::Error),
    Rejected(TicketRepositoryError),
}

impl From<diesel::result::Error> for WriteError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn pool_error(error: PoolError) -> TicketRepositoryError {
    map_pool_error(error, TicketRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> TicketRepositoryError {
    map_diesel_error(error, TicketRepositoryError::query, TicketRepositoryError::connection)
}

fn write_error(error: WriteError) -> TicketRepositoryError {
    match error {
        WriteError::Diesel(err) => diesel_error(err),
        WriteError::Rejected(err) => err,
    }
}

fn stored_revision(ticket: &Ticket) -> Result<i32, TicketRepositoryError> {
    i32::try_from(ticket.revision())
        .map_err(|_| TicketRepositoryError::query("ticket revision overflow"))
}

fn new_ticket_row(ticket: &Ticket) -> Result<NewTicketRow<'_>, TicketRepositoryError> {
    Ok(NewTicketRow {
        id: *ticket.id().as_uuid(),
        title: ticket.title().as_str(),
        description: ticket.description().as_str(),
        category: ticket.category().slug(),
        area_name: ticket.area_name(),
        priority: i16::from(ticket.priority().value()),
        urgency_level: ticket.urgency_level().label(),
        status: ticket.status().slug(),
        reported_by: *ticket.reported_by().as_uuid(),
        reporter_name: ticket.reporter_name().as_str(),
        reporter_email: ticket.reporter_email().as_str(),
        assigned_team: ticket.assigned_team().map(|team| team.as_str()),
        planned_date: ticket.planned_date(),
        revision: stored_revision(ticket)?,
        created_at: ticket.created_at(),
        updated_at: ticket.updated_at(),
    })
}

fn ticket_update(ticket: &Ticket) -> Result<TicketUpdate<'_>, TicketRepositoryError> {
    Ok(TicketUpdate {
        status: ticket.status().slug(),
        assigned_team: ticket.assigned_team().map(|team| team.as_str()),
        revision: stored_revision(ticket)?,
        updated_at: ticket.updated_at(),
    })
}

fn evidence_row(item: &Evidence) -> EvidenceRow {
    EvidenceRow {
        id: *item.id.as_uuid(),
        ticket_id: *item.ticket_id.as_uuid(),
        image_ref: item.image_ref.clone(),
        description: item.description.clone(),
        uploaded_by: *item.uploaded_by.as_uuid(),
        created_at: item.created_at,
    }
}

/// Evidence on `ticket` whose id is not in `stored`.
fn unsaved_evidence(ticket: &Ticket, stored: &HashSet<Uuid>) -> Vec<EvidenceRow> {
    ticket
        .evidence()
        .iter()
        .filter(|item| !stored.contains(item.id.as_uuid()))
        .map(evidence_row)
        .collect()
}

fn row_to_evidence(row: EvidenceRow) -> Evidence {
    Evidence {
        id: EvidenceId::from_uuid(row.id),
        ticket_id: TicketId::from_uuid(row.ticket_id),
        image_ref: row.image_ref,
        description: row.description,
        uploaded_by: UserId::from_uuid(row.uploaded_by),
        created_at: row.created_at,
    }
}

fn corrupt(ticket_id: Uuid, field: &str, detail: impl std::fmt::Display) -> TicketRepositoryError {
    warn!(%ticket_id, field, error = %detail, "stored ticket failed validation");
    TicketRepositoryError::query(format!("stored ticket has invalid {field}"))
}

fn row_to_ticket(
    row: TicketRow,
    evidence: Vec<EvidenceRow>,
) -> Result<Ticket, TicketRepositoryError> {
    let id = row.id;
    let category = Category::ALL
        .into_iter()
        .find(|category| category.slug() == row.category)
        .ok_or_else(|| corrupt(id, "category", &row.category))?;
    let priority =
        Priority::new(i64::from(row.priority)).map_err(|err| corrupt(id, "priority", err))?;
    let status: TicketStatus = row.status.parse().map_err(|err| corrupt(id, "status", err))?;
    let revision = u32::try_from(row.revision).map_err(|err| corrupt(id, "revision", err))?;

    Ticket::restore(TicketSnapshot {
        id: TicketId::from_uuid(id),
        title: row.title,
        description: row.description,
        category,
        area_name: row.area_name,
        priority,
        status,
        reported_by: UserId::from_uuid(row.reported_by),
        reporter_name: row.reporter_name,
        reporter_email: row.reporter_email,
        assigned_team: row.assigned_team,
        planned_date: row.planned_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
        revision,
        evidence: evidence.into_iter().map(row_to_evidence).collect(),
    })
    .map_err(|err| corrupt(id, "fields", err))
}

/// Attach evidence to each row and rebuild the aggregates.
fn assemble(
    rows: Vec<TicketRow>,
    evidence: Vec<EvidenceRow>,
) -> Result<Vec<Ticket>, TicketRepositoryError> {
    let mut by_ticket: HashMap<Uuid, Vec<EvidenceRow>> = HashMap::new();
    for item in evidence {
        by_ticket.entry(item.ticket_id).or_default().push(item);
    }
    rows.into_iter()
        .map(|row| {
            let attached = by_ticket.remove(&row.id).unwrap_or_default();
            row_to_ticket(row, attached)
        })
        .collect()
}

async fn load_evidence(
    conn: &mut AsyncPgConnection,
    ticket_ids: &[Uuid],
) -> Result<Vec<EvidenceRow>, diesel::result::Error> {
    if ticket_ids.is_empty() {
        return Ok(Vec::new());
    }
    ticket_evidence::table
        .filter(ticket_evidence::ticket_id.eq_any(ticket_ids))
        .order((ticket_evidence::created_at.asc(), ticket_evidence::id.asc()))
        .select(EvidenceRow::as_select())
        .load(conn)
        .await
}

#[async_trait]
impl TicketRepository for DieselTicketRepository {
    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let row = new_ticket_row(ticket)?;
        let evidence: Vec<EvidenceRow> = ticket.evidence().iter().map(evidence_row).collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(tickets::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                if !evidence.is_empty() {
                    diesel::insert_into(ticket_evidence::table)
                        .values(&evidence)
                        .execute(conn)
                        .await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                TicketRepositoryError::duplicate(ticket.id().to_string())
            } else {
                diesel_error(err)
            }
        })
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<TicketRow> = tickets::table
            .filter(tickets::id.eq(id.as_uuid()))
            .select(TicketRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let evidence = load_evidence(&mut conn, &[row.id]).await.map_err(diesel_error)?;
        row_to_ticket(row, evidence).map(Some)
    }

    async fn list_all(&self) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<TicketRow> = tickets::table
            .select(TicketRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let evidence = load_evidence(&mut conn, &ids).await.map_err(diesel_error)?;
        assemble(rows, evidence)
    }

    async fn list_by_reporter(
        &self,
        reporter: &UserId,
    ) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<TicketRow> = tickets::table
            .filter(tickets::reported_by.eq(reporter.as_uuid()))
            .select(TicketRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let evidence = load_evidence(&mut conn, &ids).await.map_err(diesel_error)?;
        assemble(rows, evidence)
    }

    async fn update(
        &self,
        ticket: &Ticket,
        expected_revision: u32,
    ) -> Result<(), TicketRepositoryError> {
        let changes = ticket_update(ticket)?;
        let ticket_id = *ticket.id().as_uuid();
        let expected = i32::try_from(expected_revision)
            .map_err(|_| TicketRepositoryError::query("expected revision overflow"))?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        conn.transaction(|conn| {
            async move {
                let updated = diesel::update(
                    tickets::table
                        .filter(tickets::id.eq(ticket_id).and(tickets::revision.eq(expected))),
                )
                .set(&changes)
                .execute(conn)
                .await?;

                if updated == 0 {
                    let actual: Option<i32> = tickets::table
                        .filter(tickets::id.eq(ticket_id))
                        .select(tickets::revision)
                        .first(conn)
                        .await
                        .optional()?;
                    let rejected = match actual {
                        Some(actual) => TicketRepositoryError::revision_mismatch(
                            expected_revision,
                            u32::try_from(actual).unwrap_or_default(),
                        ),
                        None => TicketRepositoryError::missing(ticket_id.to_string()),
                    };
                    return Err(WriteError::Rejected(rejected));
                }

                let stored: HashSet<Uuid> = ticket_evidence::table
                    .filter(ticket_evidence::ticket_id.eq(ticket_id))
                    .select(ticket_evidence::id)
                    .load::<Uuid>(conn)
                    .await?
                    .into_iter()
                    .collect();
                let fresh = unsaved_evidence(ticket, &stored);
                if !fresh.is_empty() {
                    diesel::insert_into(ticket_evidence::table)
                        .values(&fresh)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rstest::rstest;

    fn reported_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    fn row(category: &str, status: &str, priority: i16) -> TicketRow {
        let now = reported_at();
        TicketRow {
            id: Uuid::new_v4(),
            title: "Luminaria apagada".to_owned(),
            description: "Luminaria apagada en la esquina".to_owned(),
            category: category.to_owned(),
            area_name: "Alumbrado Público".to_owned(),
            priority,
            urgency_level: "Media".to_owned(),
            status: status.to_owned(),
            reported_by: Uuid::new_v4(),
            reporter_name: "Ana".to_owned(),
            reporter_email: "ana@municipio.cl".to_owned(),
            assigned_team: None,
            planned_date: now + Duration::hours(72),
            revision: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn evidence_for(ticket_id: Uuid, uploaded_by: Uuid, minutes: i64) -> EvidenceRow {
        EvidenceRow {
            id: Uuid::new_v4(),
            ticket_id,
            image_ref: format!("https://img.example/{minutes}.jpg"),
            description: None,
            uploaded_by,
            created_at: reported_at() + Duration::minutes(minutes),
        }
    }

    #[rstest]
    fn row_restores_ticket_with_sorted_evidence() {
        let source = row("alumbrado_publico", "received", 75);
        let (id, reporter) = (source.id, source.reported_by);
        let late = evidence_for(id, reporter, 10);
        let early = evidence_for(id, reporter, 1);
        let early_id = early.id;

        let ticket = row_to_ticket(source, vec![late, early]).expect("valid row");

        assert_eq!(ticket.category(), Category::PublicLighting);
        assert_eq!(ticket.status(), TicketStatus::Received);
        assert_eq!(ticket.evidence().len(), 2);
        assert_eq!(ticket.evidence()[0].id.as_uuid(), &early_id);
    }

    #[rstest]
    #[case("desconocida", "received", 75, "category")]
    #[case("alumbrado_publico", "archived", 75, "status")]
    #[case("alumbrado_publico", "received", 140, "priority")]
    #[case("areas_verdes", "received", 90, "fields")]
    fn corrupt_rows_are_query_errors(
        #[case] category: &str,
        #[case] status: &str,
        #[case] priority: i16,
        #[case] field: &str,
    ) {
        let err =
            row_to_ticket(row(category, status, priority), Vec::new()).expect_err("corrupt row");

        assert!(matches!(err, TicketRepositoryError::Query { .. }));
        assert!(err.to_string().contains(field));
    }

    #[rstest]
    fn assemble_routes_evidence_to_owning_ticket() {
        let first = row("alumbrado_publico", "received", 75);
        let second = row("alumbrado_publico", "assigned", 75);
        let attached = evidence_for(second.id, second.reported_by, 0);
        let second_id = second.id;

        let tickets = assemble(vec![first, second], vec![attached]).expect("valid rows");

        let counts: HashMap<Uuid, usize> = tickets
            .iter()
            .map(|ticket| (*ticket.id().as_uuid(), ticket.evidence().len()))
            .collect();
        assert_eq!(counts.get(&second_id), Some(&1));
        assert_eq!(counts.values().sum::<usize>(), 1);
    }

    #[rstest]
    fn rejected_writes_pass_through_unchanged() {
        let err = write_error(WriteError::Rejected(
            TicketRepositoryError::revision_mismatch(2_u32, 3_u32),
        ));

        assert_eq!(err, TicketRepositoryError::revision_mismatch(2_u32, 3_u32));
    }

    #[rstest]
    fn update_changeset_leaves_write_once_columns_alone() {
        let ticket = row_to_ticket(row("alumbrado_publico", "assigned", 75), Vec::new())
            .expect("valid row");
        let changes = ticket_update(&ticket).expect("changeset");

        let sql = diesel::debug_query::<diesel::pg::Pg, _>(
            &diesel::update(tickets::table).set(&changes),
        )
        .to_string();

        for column in ["\"status\"", "\"assigned_team\"", "\"revision\"", "\"updated_at\""] {
            assert!(sql.contains(column), "{column} missing from {sql}");
        }
        for column in [
            "\"priority\"",
            "\"urgency_level\"",
            "\"category\"",
            "\"title\"",
            "\"planned_date\"",
        ] {
            assert!(!sql.contains(column), "{column} rewritten by {sql}");
        }
    }

    #[rstest]
    fn only_evidence_missing_from_storage_is_written() {
        let source = row("alumbrado_publico", "in_progress", 75);
        let (id, reporter) = (source.id, source.reported_by);
        let saved = evidence_for(id, reporter, 1);
        let fresh = evidence_for(id, reporter, 5);
        let (saved_id, fresh_id) = (saved.id, fresh.id);
        let ticket = row_to_ticket(source, vec![saved, fresh]).expect("valid row");

        let pending = unsaved_evidence(&ticket, &HashSet::from([saved_id]));

        assert_eq!(pending.iter().map(|item| item.id).collect::<Vec<_>>(), vec![fresh_id]);
        assert!(unsaved_evidence(&ticket, &HashSet::from([saved_id, fresh_id])).is_empty());
    }
}
