//! Internal Diesel row structs.
//!
//! Implementation details of the persistence layer; never exposed to the
//! domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{ticket_evidence, tickets, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the tickets table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TicketRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub area_name: String,
    pub priority: i16,
    #[expect(dead_code, reason = "derived from priority when the ticket is rebuilt")]
    pub urgency_level: String,
    pub status: String,
    pub reported_by: Uuid,
    pub reporter_name: String,
    pub reporter_email: String,
    pub assigned_team: Option<String>,
    pub planned_date: DateTime<Utc>,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for new tickets.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tickets)]
pub(crate) struct NewTicketRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub area_name: &'a str,
    pub priority: i16,
    pub urgency_level: &'a str,
    pub status: &'a str,
    pub reported_by: Uuid,
    pub reporter_name: &'a str,
    pub reporter_email: &'a str,
    pub assigned_team: Option<&'a str>,
    pub planned_date: DateTime<Utc>,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset for the columns a mutation may touch.
///
/// Classification, reporter snapshot and planned date are written once by
/// [`NewTicketRow`].
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tickets)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TicketUpdate<'a> {
    pub status: &'a str,
    pub assigned_team: Option<&'a str>,
    pub revision: i32,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading and writing ticket evidence.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = ticket_evidence)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EvidenceRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub image_ref: String,
    pub description: Option<String>,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}
