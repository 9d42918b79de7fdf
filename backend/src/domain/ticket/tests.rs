//! Regression coverage for the ticket aggregate.

use super::*;
use crate::domain::classifier::{IncidentClassifier, KeywordClassifier};
use chrono::TimeZone;
use rstest::{fixture, rstest};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0)
        .single()
        .expect("valid fixture time")
}

#[fixture]
fn reporter() -> UserId {
    UserId::new("11111111-1111-4111-8111-111111111111").expect("fixture UUID")
}

#[fixture]
fn ticket(reporter: UserId) -> Ticket {
    let description = "Poste sin luz en la esquina";
    Ticket::open(
        TicketId::random(),
        NewTicket {
            title: TicketTitle::new("Poste sin luz").expect("valid title"),
            description: TicketDescription::new(description).expect("valid description"),
            classification: KeywordClassifier.classify(description, None),
            reporter,
            reporter_name: UserName::new("Ana").expect("valid name"),
            reporter_email: EmailAddress::new("ana@municipio.cl").expect("valid email"),
        },
        at(8),
    )
}

fn evidence_for(ticket: &Ticket, uploader: UserId, created_at: DateTime<Utc>) -> Evidence {
    EvidenceDraft::try_new("https://img.example/foto.jpg", Some("foto"))
        .expect("valid draft")
        .into_evidence(EvidenceId::random(), *ticket.id(), uploader, created_at)
}

#[rstest]
fn open_sets_initial_state(ticket: Ticket) {
    assert_eq!(ticket.status(), TicketStatus::Received);
    assert_eq!(ticket.revision(), 1);
    assert_eq!(ticket.category(), Category::PublicLighting);
    assert_eq!(ticket.area_name(), "Alumbrado Público");
    assert_eq!(ticket.urgency_level(), UrgencyLevel::Medium);
    assert_eq!(ticket.planned_date(), at(8) + Duration::hours(RESOLUTION_SLA_HOURS));
    assert!(ticket.assigned_team().is_none());
    assert!(ticket.evidence().is_empty());
}

#[rstest]
fn full_lifecycle_bumps_revision_each_step(mut ticket: Ticket) {
    for (step, target) in TicketStatus::ALL.into_iter().skip(1).enumerate() {
        ticket.advance_to(target, at(9)).expect("adjacent transition");
        assert_eq!(ticket.revision(), u32::try_from(step).expect("small") + 2);
    }
    assert_eq!(ticket.status(), TicketStatus::Closed);
}

#[rstest]
#[case(TicketStatus::Received)]
#[case(TicketStatus::InProgress)]
#[case(TicketStatus::Closed)]
fn non_adjacent_transition_is_rejected_without_mutation(
    mut ticket: Ticket,
    #[case] target: TicketStatus,
) {
    let before = ticket.clone();
    let err = ticket.advance_to(target, at(9)).expect_err("must be rejected");
    assert_eq!(
        err,
        TicketMutationError::InvalidTransition {
            from: TicketStatus::Received,
            to: target
        }
    );
    assert_eq!(ticket, before);
}

#[rstest]
fn closed_ticket_is_terminal(mut ticket: Ticket) {
    for target in TicketStatus::ALL.into_iter().skip(1) {
        ticket.advance_to(target, at(9)).expect("adjacent transition");
    }
    for target in TicketStatus::ALL {
        assert!(ticket.advance_to(target, at(10)).is_err());
    }
}

#[rstest]
fn assigning_received_ticket_moves_to_assigned(mut ticket: Ticket) {
    ticket
        .assign_team(TeamName::new("Cuadrilla Norte").expect("valid team"), at(9))
        .expect("assignment allowed");
    assert_eq!(ticket.status(), TicketStatus::Assigned);
    assert_eq!(ticket.assigned_team().map(TeamName::as_str), Some("Cuadrilla Norte"));
    assert_eq!(ticket.revision(), 2);
    assert_eq!(ticket.updated_at(), at(9));
}

#[rstest]
fn reassigning_in_progress_keeps_status(mut ticket: Ticket) {
    ticket.advance_to(TicketStatus::Assigned, at(9)).expect("adjacent");
    ticket.advance_to(TicketStatus::InProgress, at(9)).expect("adjacent");
    ticket
        .assign_team(TeamName::new("Cuadrilla Sur").expect("valid team"), at(10))
        .expect("reassignment allowed");
    assert_eq!(ticket.status(), TicketStatus::InProgress);
}

#[rstest]
fn assigning_resolved_ticket_is_rejected(mut ticket: Ticket) {
    for target in [TicketStatus::Assigned, TicketStatus::InProgress, TicketStatus::Resolved] {
        ticket.advance_to(target, at(9)).expect("adjacent");
    }
    let before = ticket.clone();
    let err = ticket
        .assign_team(TeamName::new("Cuadrilla").expect("valid team"), at(10))
        .expect_err("closed window");
    assert_eq!(
        err,
        TicketMutationError::AssignmentClosed {
            status: TicketStatus::Resolved
        }
    );
    assert_eq!(ticket, before);
}

#[rstest]
fn evidence_from_reporter_is_appended_in_order(mut ticket: Ticket, reporter: UserId) {
    let late = evidence_for(&ticket, reporter, at(11));
    let early = evidence_for(&ticket, reporter, at(9));
    ticket.attach_evidence(late.clone(), at(11)).expect("reporter upload");
    ticket.attach_evidence(early.clone(), at(12)).expect("reporter upload");
    assert_eq!(ticket.evidence(), &[early, late]);
    assert_eq!(ticket.revision(), 3);
}

#[rstest]
fn evidence_from_stranger_is_rejected(mut ticket: Ticket) {
    let item = evidence_for(&ticket, UserId::random(), at(9));
    assert_eq!(
        ticket.attach_evidence(item, at(9)),
        Err(TicketMutationError::NotReporter)
    );
    assert!(ticket.evidence().is_empty());
}

#[rstest]
fn evidence_for_other_ticket_is_rejected(mut ticket: Ticket, reporter: UserId) {
    let item = EvidenceDraft::try_new("data:image/png;base64,AAAA", None)
        .expect("valid draft")
        .into_evidence(EvidenceId::random(), TicketId::random(), reporter, at(9));
    assert_eq!(
        ticket.attach_evidence(item, at(9)),
        Err(TicketMutationError::ForeignEvidence)
    );
}

fn snapshot_of(ticket: &Ticket) -> TicketSnapshot {
    TicketSnapshot {
        id: *ticket.id(),
        title: ticket.title().as_str().to_owned(),
        description: ticket.description().as_str().to_owned(),
        category: ticket.category(),
        area_name: ticket.area_name().to_owned(),
        priority: ticket.priority(),
        status: ticket.status(),
        reported_by: *ticket.reported_by(),
        reporter_name: ticket.reporter_name().as_str().to_owned(),
        reporter_email: ticket.reporter_email().as_str().to_owned(),
        assigned_team: ticket.assigned_team().map(|team| team.as_str().to_owned()),
        planned_date: ticket.planned_date(),
        created_at: ticket.created_at(),
        updated_at: ticket.updated_at(),
        revision: ticket.revision(),
        evidence: ticket.evidence().to_vec(),
    }
}

#[rstest]
fn restore_accepts_consistent_snapshot(ticket: Ticket) {
    let restored = Ticket::restore(snapshot_of(&ticket)).expect("consistent snapshot");
    assert_eq!(restored, ticket);
}

#[rstest]
fn restore_rejects_diverged_area_name(ticket: Ticket) {
    let mut snapshot = snapshot_of(&ticket);
    snapshot.area_name = "Aseo".to_owned();
    assert!(matches!(
        Ticket::restore(snapshot),
        Err(TicketValidationError::AreaMismatch { .. })
    ));
}

#[rstest]
fn restore_rejects_zero_revision(ticket: Ticket) {
    let mut snapshot = snapshot_of(&ticket);
    snapshot.revision = 0;
    assert_eq!(Ticket::restore(snapshot), Err(TicketValidationError::ZeroRevision));
}

#[rstest]
#[case("", TicketValidationError::EmptyTeam)]
#[case("  ", TicketValidationError::EmptyTeam)]
fn team_name_rejects_blank(#[case] raw: &str, #[case] expected: TicketValidationError) {
    assert_eq!(TeamName::new(raw), Err(expected));
}

#[rstest]
#[case("", TicketValidationError::EmptyTitle)]
#[case(" \t ", TicketValidationError::EmptyTitle)]
fn title_rejects_blank(#[case] raw: &str, #[case] expected: TicketValidationError) {
    assert_eq!(TicketTitle::new(raw), Err(expected));
}

#[rstest]
fn title_is_trimmed_and_bounded() {
    let title = TicketTitle::new("  Poste caído  ").expect("valid title");
    assert_eq!(title.as_str(), "Poste caído");

    let at_limit = "é".repeat(TITLE_MAX);
    assert!(TicketTitle::new(&at_limit).is_ok());
    assert_eq!(
        TicketTitle::new(format!("{at_limit}x")),
        Err(TicketValidationError::TitleTooLong { max: TITLE_MAX })
    );
}

#[rstest]
fn restore_rejects_blank_stored_title(ticket: Ticket) {
    let mut snapshot = snapshot_of(&ticket);
    snapshot.title = " ".to_owned();
    assert_eq!(Ticket::restore(snapshot), Err(TicketValidationError::EmptyTitle));
}

#[rstest]
fn description_rejects_overlong_text() {
    let raw = "x".repeat(DESCRIPTION_MAX + 1);
    assert_eq!(
        TicketDescription::new(raw),
        Err(TicketValidationError::DescriptionTooLong {
            max: DESCRIPTION_MAX
        })
    );
}
