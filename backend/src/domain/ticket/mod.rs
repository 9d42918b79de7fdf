//! Incident ticket aggregate.
//!
//! A ticket is created in [`TicketStatus::Received`] and only ever moves
//! forward. Every successful mutation bumps `revision` by one; persistence
//! adapters use it for optimistic concurrency. Mutation methods validate
//! first and leave the ticket untouched when they fail.

mod evidence;
mod status;

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::classifier::{Category, Classification, Priority, UrgencyLevel};
use crate::domain::user::{EmailAddress, UserId, UserName, UserValidationError};

pub use evidence::{
    Evidence, EvidenceDraft, EvidenceId, EvidenceValidationError, MAX_EVIDENCE_DESCRIPTION,
    MAX_IMAGE_REFERENCE_BYTES,
};
pub use status::{TicketStatus, UnknownStatus};

/// Service-level target between report and planned resolution.
pub const RESOLUTION_SLA_HOURS: i64 = 72;
/// Maximum characters in a [`TicketTitle`].
pub const TITLE_MAX: usize = 120;
/// Maximum characters in a [`TicketDescription`].
pub const DESCRIPTION_MAX: usize = 4_000;
/// Maximum characters in a [`TeamName`].
pub const TEAM_NAME_MAX: usize = 120;

/// Validation errors raised while building ticket values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketValidationError {
    /// The identifier was not a UUID.
    #[error("ticket id must be a valid UUID")]
    InvalidId,
    /// The title was blank once trimmed.
    #[error("title must not be empty")]
    EmptyTitle,
    /// The title exceeded [`TITLE_MAX`].
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    /// The description was blank once trimmed.
    #[error("description must not be empty")]
    EmptyDescription,
    /// The description exceeded [`DESCRIPTION_MAX`].
    #[error("description must be at most {max} characters")]
    DescriptionTooLong { max: usize },
    /// The team name was blank once trimmed.
    #[error("team must not be empty")]
    EmptyTeam,
    /// The team name exceeded [`TEAM_NAME_MAX`].
    #[error("team must be at most {max} characters")]
    TeamTooLong { max: usize },
    /// A stored area name disagrees with its category.
    #[error("area name '{area_name}' does not match category '{category}'")]
    AreaMismatch { category: Category, area_name: String },
    /// Stored revisions start at one.
    #[error("revision must be at least 1")]
    ZeroRevision,
    /// Reporter fields failed validation.
    #[error(transparent)]
    Reporter(#[from] UserValidationError),
}

/// Stable ticket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Parse an identifier from its canonical string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| TicketValidationError::InvalidId)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Short headline for an incident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTitle(String);

impl TicketTitle {
    /// Validate a title; surrounding whitespace is trimmed.
    pub fn new(text: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TicketValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > TITLE_MAX {
            return Err(TicketValidationError::TitleTooLong { max: TITLE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Citizen-supplied incident description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDescription(String);

impl TicketDescription {
    /// Validate a description; surrounding whitespace is trimmed.
    pub fn new(text: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TicketValidationError::EmptyDescription);
        }
        if trimmed.chars().count() > DESCRIPTION_MAX {
            return Err(TicketValidationError::DescriptionTooLong {
                max: DESCRIPTION_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Name of the municipal team handling a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamName(String);

impl TeamName {
    /// Validate a team name; surrounding whitespace is trimmed.
    pub fn new(name: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TicketValidationError::EmptyTeam);
        }
        if trimmed.chars().count() > TEAM_NAME_MAX {
            return Err(TicketValidationError::TeamTooLong { max: TEAM_NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Rejected ticket mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketMutationError {
    /// `to` is not the immediate successor of `from`.
    #[error("cannot move ticket from {from} to {to}")]
    InvalidTransition { from: TicketStatus, to: TicketStatus },
    /// Teams cannot change once work is resolved.
    #[error("cannot assign a team to a ticket in status {status}")]
    AssignmentClosed { status: TicketStatus },
    /// Only the reporter may attach evidence.
    #[error("only the reporter may attach evidence")]
    NotReporter,
    /// The evidence names a different ticket.
    #[error("evidence belongs to another ticket")]
    ForeignEvidence,
}

/// Input for opening a new ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// Headline chosen by the citizen.
    pub title: TicketTitle,
    /// What the citizen reported.
    pub description: TicketDescription,
    /// Category and priority chosen by the classifier.
    pub classification: Classification,
    /// Reporting account.
    pub reporter: UserId,
    /// Reporter name snapshot.
    pub reporter_name: UserName,
    /// Reporter email snapshot.
    pub reporter_email: EmailAddress,
}

/// Untyped ticket state read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSnapshot {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub area_name: String,
    pub priority: Priority,
    pub status: TicketStatus,
    pub reported_by: UserId,
    pub reporter_name: String,
    pub reporter_email: String,
    pub assigned_team: Option<String>,
    pub planned_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: u32,
    pub evidence: Vec<Evidence>,
}

/// Incident ticket.
///
/// ## Invariants
/// - `area_name` always equals `category.label()`.
/// - `status` only moves to its immediate successor.
/// - `revision` starts at 1 and grows by one per mutation.
/// - `evidence` is ordered by `created_at` and only holds the reporter's
///   uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    id: TicketId,
    title: TicketTitle,
    description: TicketDescription,
    category: Category,
    area_name: String,
    priority: Priority,
    status: TicketStatus,
    reported_by: UserId,
    reporter_name: UserName,
    reporter_email: EmailAddress,
    assigned_team: Option<TeamName>,
    planned_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u32,
    evidence: Vec<Evidence>,
}

impl Ticket {
    /// Open a ticket in [`TicketStatus::Received`].
    pub fn open(id: TicketId, new: NewTicket, at: DateTime<Utc>) -> Self {
        let NewTicket {
            title,
            description,
            classification,
            reporter,
            reporter_name,
            reporter_email,
        } = new;
        Self {
            id,
            title,
            description,
            category: classification.category,
            area_name: classification.category.label().to_owned(),
            priority: classification.priority,
            status: TicketStatus::Received,
            reported_by: reporter,
            reporter_name,
            reporter_email,
            assigned_team: None,
            planned_date: at + Duration::hours(RESOLUTION_SLA_HOURS),
            created_at: at,
            updated_at: at,
            revision: 1,
            evidence: Vec::new(),
        }
    }

    /// Rebuild a ticket from stored state, re-checking its invariants.
    pub fn restore(snapshot: TicketSnapshot) -> Result<Self, TicketValidationError> {
        let TicketSnapshot {
            id,
            title,
            description,
            category,
            area_name,
            priority,
            status,
            reported_by,
            reporter_name,
            reporter_email,
            assigned_team,
            planned_date,
            created_at,
            updated_at,
            revision,
            mut evidence,
        } = snapshot;
        if area_name != category.label() {
            return Err(TicketValidationError::AreaMismatch {
                category,
                area_name,
            });
        }
        if revision == 0 {
            return Err(TicketValidationError::ZeroRevision);
        }
        evidence.sort_by_key(|item| item.created_at);
        Ok(Self {
            id,
            title: TicketTitle::new(title)?,
            description: TicketDescription::new(description)?,
            category,
            area_name,
            priority,
            status,
            reported_by,
            reporter_name: UserName::new(reporter_name)?,
            reporter_email: EmailAddress::new(reporter_email)?,
            assigned_team: assigned_team.map(TeamName::new).transpose()?,
            planned_date,
            created_at,
            updated_at,
            revision,
            evidence,
        })
    }

    /// Move to `target`, which must be the immediate successor.
    pub fn advance_to(
        &mut self,
        target: TicketStatus,
        at: DateTime<Utc>,
    ) -> Result<(), TicketMutationError> {
        if !self.status.can_advance_to(target) {
            return Err(TicketMutationError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch(at);
        Ok(())
    }

    /// Route the ticket to `team`.
    ///
    /// A ticket still in `Received` moves to `Assigned`. Later open states
    /// keep their status and only swap the team.
    pub fn assign_team(
        &mut self,
        team: TeamName,
        at: DateTime<Utc>,
    ) -> Result<(), TicketMutationError> {
        if !self.status.accepts_team_assignment() {
            return Err(TicketMutationError::AssignmentClosed {
                status: self.status,
            });
        }
        if self.status == TicketStatus::Received {
            self.status = TicketStatus::Assigned;
        }
        self.assigned_team = Some(team);
        self.touch(at);
        Ok(())
    }

    /// Append reporter-supplied evidence, keeping creation order.
    pub fn attach_evidence(
        &mut self,
        item: Evidence,
        at: DateTime<Utc>,
    ) -> Result<(), TicketMutationError> {
        if item.ticket_id != self.id {
            return Err(TicketMutationError::ForeignEvidence);
        }
        if item.uploaded_by != self.reported_by {
            return Err(TicketMutationError::NotReporter);
        }
        let position = self
            .evidence
            .partition_point(|existing| existing.created_at <= item.created_at);
        self.evidence.insert(position, item);
        self.touch(at);
        Ok(())
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.revision = self.revision.saturating_add(1);
        self.updated_at = at;
    }

    /// Stable identifier.
    pub fn id(&self) -> &TicketId {
        &self.id
    }

    /// Headline given at creation.
    pub fn title(&self) -> &TicketTitle {
        &self.title
    }

    /// Reported description.
    pub fn description(&self) -> &TicketDescription {
        &self.description
    }

    /// Responsible service area.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Display name of the service area.
    pub fn area_name(&self) -> &str {
        self.area_name.as_str()
    }

    /// Current priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Urgency band derived from the priority.
    pub fn urgency_level(&self) -> UrgencyLevel {
        self.priority.urgency()
    }

    /// Lifecycle state.
    pub fn status(&self) -> TicketStatus {
        self.status
    }

    /// Reporting account.
    pub fn reported_by(&self) -> &UserId {
        &self.reported_by
    }

    /// Whether `user` reported this ticket.
    pub fn is_reported_by(&self, user: &UserId) -> bool {
        &self.reported_by == user
    }

    /// Reporter name captured at creation.
    pub fn reporter_name(&self) -> &UserName {
        &self.reporter_name
    }

    /// Reporter email captured at creation.
    pub fn reporter_email(&self) -> &EmailAddress {
        &self.reporter_email
    }

    /// Team currently responsible, if routed.
    pub fn assigned_team(&self) -> Option<&TeamName> {
        self.assigned_team.as_ref()
    }

    /// Target resolution instant.
    pub fn planned_date(&self) -> DateTime<Utc> {
        self.planned_date
    }

    /// Creation instant.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last mutation instant.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Optimistic concurrency token.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Attached evidence, oldest first.
    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }
}

#[cfg(test)]
mod tests;
