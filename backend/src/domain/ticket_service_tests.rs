//! Tests for the ticket service role policy and orderings.

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockTicketRepository, MockUserRepository};
use crate::domain::{
    Category, Classification, EmailAddress, ErrorCode, KeywordClassifier, PasswordHash,
    TicketDescription, TicketTitle, User, UserId, UserName,
};

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<chrono::Local> {
        self.utc_now.with_timezone(&chrono::Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 4, 8, 0, 0)
        .single()
        .expect("valid fixture time")
}

#[fixture]
fn citizen() -> User {
    User::new(
        UserId::new("44444444-4444-4444-8444-444444444444").expect("fixture UUID"),
        UserName::new("Ana").expect("valid"),
        EmailAddress::new("ana@municipio.cl").expect("valid"),
        PasswordHash::from_encoded("unused"),
        Role::Citizen,
        now(),
    )
}

fn identity(user: &User) -> Identity {
    Identity {
        user_id: *user.id(),
        role: user.role(),
    }
}

fn operator() -> Identity {
    Identity {
        user_id: UserId::random(),
        role: Role::Operator,
    }
}

fn ticket(reporter: &User, category: Category, created_at: DateTime<Utc>) -> Ticket {
    Ticket::open(
        TicketId::random(),
        NewTicket {
            title: TicketTitle::new("Incidente").expect("valid"),
            description: TicketDescription::new("sample incident").expect("valid"),
            classification: Classification {
                category,
                priority: category.base_priority(),
            },
            reporter: *reporter.id(),
            reporter_name: reporter.name().clone(),
            reporter_email: reporter.email().clone(),
        },
        created_at,
    )
}

fn service(
    tickets: MockTicketRepository,
    users: MockUserRepository,
) -> TicketServiceImpl<MockTicketRepository, MockUserRepository> {
    let store = TicketStore::new(Arc::new(tickets), Arc::new(FixtureClock { utc_now: now() }));
    TicketServiceImpl::new(store, Arc::new(users), Arc::new(KeywordClassifier))
}

fn create_request(text: &str, hint: Option<&str>) -> CreateTicketRequest {
    CreateTicketRequest {
        title: TicketTitle::new("Reporte vecinal").expect("valid"),
        description: TicketDescription::new(text).expect("valid"),
        category_hint: hint.map(str::to_owned),
    }
}

#[rstest]
#[tokio::test]
async fn create_ticket_classifies_and_snapshots_reporter(citizen: User) {
    let mut users = MockUserRepository::new();
    let found = citizen.clone();
    users
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(found)));
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_insert()
        .withf(|ticket| ticket.status() == TicketStatus::Received && ticket.revision() == 1)
        .times(1)
        .return_once(|_| Ok(()));

    let created = service(tickets, users)
        .create_ticket(&identity(&citizen), create_request("Hay basura en la plaza", None))
        .await
        .expect("ticket created");

    assert_eq!(created.title().as_str(), "Reporte vecinal");
    assert_eq!(created.category(), Category::Cleaning);
    assert_eq!(created.priority().value(), 70);
    assert_eq!(created.reporter_email(), citizen.email());
    assert_eq!(created.planned_date(), now() + Duration::hours(72));
}

#[rstest]
#[tokio::test]
async fn create_ticket_honours_known_hint(citizen: User) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(citizen)));
    let mut tickets = MockTicketRepository::new();
    tickets.expect_insert().times(1).return_once(|_| Ok(()));
    let caller = Identity {
        user_id: UserId::new("44444444-4444-4444-8444-444444444444").expect("fixture UUID"),
        role: Role::Citizen,
    };

    let created = service(tickets, users)
        .create_ticket(&caller, create_request("Algo raro pasa", Some("obras sanitarias")))
        .await
        .expect("ticket created");

    assert_eq!(created.category(), Category::Sanitation);
    assert_eq!(created.area_name(), "Obras Sanitarias");
}

#[rstest]
#[tokio::test]
async fn operators_cannot_report_incidents() {
    let mut tickets = MockTicketRepository::new();
    tickets.expect_insert().never();

    let err = service(tickets, MockUserRepository::new())
        .create_ticket(&operator(), create_request("Poste caído", None))
        .await
        .expect_err("operators are refused");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn citizens_cannot_list_all(citizen: User) {
    let mut tickets = MockTicketRepository::new();
    tickets.expect_list_all().never();

    let err = service(tickets, MockUserRepository::new())
        .list_all(&identity(&citizen))
        .await
        .expect_err("citizens are refused");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn citizens_cannot_drive_the_lifecycle(citizen: User) {
    let svc = service(MockTicketRepository::new(), MockUserRepository::new());
    let caller = identity(&citizen);
    let id = TicketId::random();

    let assign = svc
        .assign_team(&caller, &id, TeamName::new("Cuadrilla").expect("valid"))
        .await
        .expect_err("refused");
    let advance = svc
        .advance_status(&caller, &id, TicketStatus::Assigned)
        .await
        .expect_err("refused");

    assert_eq!(assign.code(), ErrorCode::Forbidden);
    assert_eq!(advance.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn list_all_orders_by_priority_then_age(citizen: User) {
    let older_green = ticket(&citizen, Category::GreenAreas, now() - Duration::hours(2));
    let newer_green = ticket(&citizen, Category::GreenAreas, now());
    let general = ticket(&citizen, Category::GeneralAttention, now() - Duration::hours(5));
    let lighting = ticket(&citizen, Category::PublicLighting, now() - Duration::hours(1));

    let expected = vec![
        *older_green.id(),
        *newer_green.id(),
        *lighting.id(),
        *general.id(),
    ];
    let unordered = vec![general, newer_green, lighting, older_green];
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_list_all()
        .times(1)
        .return_once(move || Ok(unordered));

    let listed = service(tickets, MockUserRepository::new())
        .list_all(&operator())
        .await
        .expect("operators may list");

    let ids: Vec<_> = listed.iter().map(|ticket| *ticket.id()).collect();
    assert_eq!(ids, expected);
}

#[rstest]
#[tokio::test]
async fn list_mine_is_newest_first(citizen: User) {
    let first = ticket(&citizen, Category::Cleaning, now() - Duration::days(2));
    let second = ticket(&citizen, Category::Cleaning, now() - Duration::days(1));
    let expected = vec![*second.id(), *first.id()];
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_list_by_reporter()
        .times(1)
        .return_once(move |_| Ok(vec![first, second]));

    let listed = service(tickets, MockUserRepository::new())
        .list_mine(&identity(&citizen))
        .await
        .expect("own listing");

    let ids: Vec<_> = listed.iter().map(|ticket| *ticket.id()).collect();
    assert_eq!(ids, expected);
}

#[rstest]
#[tokio::test]
async fn operator_assignment_moves_ticket_to_assigned(citizen: User) {
    let stored = ticket(&citizen, Category::Infrastructure, now());
    let id = *stored.id();
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(stored)));
    tickets.expect_update().times(1).return_once(|_, _| Ok(()));

    let updated = service(tickets, MockUserRepository::new())
        .assign_team(&operator(), &id, TeamName::new("Pavimentos").expect("valid"))
        .await
        .expect("assignment persisted");

    assert_eq!(updated.status(), TicketStatus::Assigned);
    assert_eq!(updated.assigned_team().map(TeamName::as_str), Some("Pavimentos"));
}

#[rstest]
#[tokio::test]
async fn operators_cannot_attach_evidence(citizen: User) {
    let stored = ticket(&citizen, Category::Infrastructure, now());
    let id = *stored.id();
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(stored)));
    tickets.expect_update().never();

    let err = service(tickets, MockUserRepository::new())
        .add_evidence(
            &operator(),
            &id,
            EvidenceDraft::try_new("https://img.example/1.jpg", None).expect("valid"),
        )
        .await
        .expect_err("only the reporter may attach evidence");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}
