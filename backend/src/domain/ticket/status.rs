//! Ticket lifecycle states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Position of a ticket in its forward-only lifecycle.
///
/// Variants are declared in lifecycle order, so the derived ordering matches
/// progress: `Received < Assigned < InProgress < Resolved < Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    /// Reported, not yet routed to a team.
    #[serde(rename = "Recibido", alias = "received")]
    Received,
    /// Routed to a team.
    #[serde(rename = "Asignado", alias = "assigned")]
    Assigned,
    /// A team is working on it.
    #[serde(rename = "En Gestión", alias = "in_progress")]
    InProgress,
    /// Work finished, awaiting closure.
    #[serde(rename = "Resuelto", alias = "resolved")]
    Resolved,
    /// Terminal.
    #[serde(rename = "Cerrado", alias = "closed")]
    Closed,
}

/// Raised when a status label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ticket status: {value}")]
pub struct UnknownStatus {
    /// Rejected label.
    pub value: String,
}

impl TicketStatus {
    /// All states in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Received,
        Self::Assigned,
        Self::InProgress,
        Self::Resolved,
        Self::Closed,
    ];

    /// The only state reachable from this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Received => Some(Self::Assigned),
            Self::Assigned => Some(Self::InProgress),
            Self::InProgress => Some(Self::Resolved),
            Self::Resolved => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Whether `target` is the immediate successor of this state.
    pub fn can_advance_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// Whether a team may still be (re)assigned in this state.
    pub fn accepts_team_assignment(self) -> bool {
        matches!(self, Self::Received | Self::Assigned | Self::InProgress)
    }

    /// Wire label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Received => "Recibido",
            Self::Assigned => "Asignado",
            Self::InProgress => "En Gestión",
            Self::Resolved => "Resuelto",
            Self::Closed => "Cerrado",
        }
    }

    /// ASCII identifier stored in the database.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TicketStatus {
    type Err = UnknownStatus;

    /// Accepts the wire label or the slug, case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.label().to_lowercase() == wanted || status.slug() == wanted)
            .ok_or_else(|| UnknownStatus {
                value: value.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn successors_walk_the_whole_lifecycle() {
        let mut walked = vec![TicketStatus::Received];
        while let Some(next) = walked.last().and_then(|status| status.next()) {
            walked.push(next);
        }
        assert_eq!(walked, TicketStatus::ALL.to_vec());
    }

    #[rstest]
    fn only_the_immediate_successor_is_reachable() {
        for (i, from) in TicketStatus::ALL.into_iter().enumerate() {
            for (j, to) in TicketStatus::ALL.into_iter().enumerate() {
                assert_eq!(from.can_advance_to(to), j == i + 1, "{from} -> {to}");
            }
        }
    }

    #[rstest]
    #[case("Recibido", TicketStatus::Received)]
    #[case("en gestión", TicketStatus::InProgress)]
    #[case("in_progress", TicketStatus::InProgress)]
    #[case(" Cerrado ", TicketStatus::Closed)]
    fn parses_labels_and_slugs(#[case] raw: &str, #[case] expected: TicketStatus) {
        assert_eq!(raw.parse::<TicketStatus>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_label() {
        assert!("Archivado".parse::<TicketStatus>().is_err());
    }

    #[rstest]
    fn deserialises_english_alias() {
        let status: TicketStatus = serde_json::from_str("\"resolved\"").expect("alias accepted");
        assert_eq!(status, TicketStatus::Resolved);
    }

    #[rstest]
    #[case(TicketStatus::Received, true)]
    #[case(TicketStatus::InProgress, true)]
    #[case(TicketStatus::Resolved, false)]
    #[case(TicketStatus::Closed, false)]
    fn team_assignment_window(#[case] status: TicketStatus, #[case] open: bool) {
        assert_eq!(status.accepts_team_assignment(), open);
    }
}
