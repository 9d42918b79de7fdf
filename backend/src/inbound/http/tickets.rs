//! Ticket HTTP handlers.
//!
//! ```text
//! POST  /api/v1/tickets                {"title":"...","description":"...","category":"aseo"}
//! GET   /api/v1/my-tickets
//! GET   /api/v1/tickets
//! PATCH /api/v1/tickets/{id}/assign    {"team":"Cuadrilla 3"}
//! PATCH /api/v1/tickets/{id}/status    {"status":"En Gestión"}
//! POST  /api/v1/tickets/{id}/evidence  {"image":"https://...","description":"..."}
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::CreateTicketRequest;
use crate::domain::{
    Error, Evidence, EvidenceDraft, EvidenceValidationError, TeamName, Ticket, TicketDescription,
    TicketStatus, TicketTitle, TicketValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerIdentity;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, field_error, parse_ticket_id, require};

/// Body for `POST /api/v1/tickets`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTicketRequest {
    #[schema(example = "Poste caído")]
    pub title: Option<String>,
    #[schema(example = "Hay un poste de luz caído en la esquina")]
    pub description: Option<String>,
    /// Optional category label or slug; unknown values are ignored.
    #[schema(example = "Alumbrado Público")]
    pub category: Option<String>,
}

/// Body for `PATCH /api/v1/tickets/{id}/assign`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignTeamRequest {
    #[schema(example = "Cuadrilla 3")]
    pub team: Option<String>,
}

/// Body for `PATCH /api/v1/tickets/{id}/status`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    /// Spanish label or English slug of the target status.
    #[schema(example = "En Gestión")]
    pub status: Option<String>,
}

/// Body for `POST /api/v1/tickets/{id}/evidence`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRequest {
    /// Image URL or base64 data URL.
    pub image: Option<String>,
    pub description: Option<String>,
}

/// Evidence attached to a ticket.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceResponse {
    pub id: String,
    pub ticket_id: String,
    pub image: String,
    pub description: Option<String>,
    pub uploaded_by: String,
    pub created_at: String,
}

impl From<&Evidence> for EvidenceResponse {
    fn from(item: &Evidence) -> Self {
        Self {
            id: item.id.as_uuid().to_string(),
            ticket_id: item.ticket_id.to_string(),
            image: item.image_ref.clone(),
            description: item.description.clone(),
            uploaded_by: item.uploaded_by.to_string(),
            created_at: item.created_at.to_rfc3339(),
        }
    }
}

/// Ticket view including the reporter snapshot and evidence.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    #[schema(example = "alumbrado_publico")]
    pub category: String,
    #[schema(example = "Alumbrado Público")]
    pub area_name: String,
    #[schema(example = 75)]
    pub priority: u8,
    #[schema(example = "Media")]
    pub urgency_level: String,
    #[schema(example = "Recibido")]
    pub status: String,
    pub reported_by: String,
    pub reporter_name: String,
    pub reporter_email: String,
    pub assigned_team: Option<String>,
    pub planned_date: String,
    pub created_at: String,
    pub updated_at: String,
    pub revision: u32,
    pub evidence: Vec<EvidenceResponse>,
}

impl From<&Ticket> for TicketResponse {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id().to_string(),
            title: ticket.title().as_str().to_owned(),
            description: ticket.description().as_str().to_owned(),
            category: ticket.category().slug().to_owned(),
            area_name: ticket.area_name().to_owned(),
            priority: ticket.priority().value(),
            urgency_level: ticket.urgency_level().label().to_owned(),
            status: ticket.status().label().to_owned(),
            reported_by: ticket.reported_by().to_string(),
            reporter_name: ticket.reporter_name().as_str().to_owned(),
            reporter_email: ticket.reporter_email().as_str().to_owned(),
            assigned_team: ticket.assigned_team().map(|team| team.as_str().to_owned()),
            planned_date: ticket.planned_date().to_rfc3339(),
            created_at: ticket.created_at().to_rfc3339(),
            updated_at: ticket.updated_at().to_rfc3339(),
            revision: ticket.revision(),
            evidence: ticket.evidence().iter().map(EvidenceResponse::from).collect(),
        }
    }
}

fn ticket_error_code(err: &TicketValidationError) -> &'static str {
    match err {
        TicketValidationError::EmptyTitle => "empty_title",
        TicketValidationError::TitleTooLong { .. } => "title_too_long",
        TicketValidationError::EmptyDescription => "empty_description",
        TicketValidationError::DescriptionTooLong { .. } => "description_too_long",
        TicketValidationError::EmptyTeam => "empty_team",
        TicketValidationError::TeamTooLong { .. } => "team_too_long",
        _ => "invalid_value",
    }
}

fn map_ticket_validation(field: FieldName, err: TicketValidationError) -> Error {
    field_error(field, ticket_error_code(&err), err.to_string())
}

fn map_evidence_validation(err: EvidenceValidationError) -> Error {
    let (field, code) = match err {
        EvidenceValidationError::EmptyImage => ("image", "empty_image"),
        EvidenceValidationError::ImageTooLarge { .. } => ("image", "image_too_large"),
        EvidenceValidationError::DescriptionTooLong { .. } => {
            ("description", "description_too_long")
        }
    };
    field_error(FieldName::new(field), code, err.to_string())
}

fn parse_status(raw: &str) -> Result<TicketStatus, Error> {
    raw.parse::<TicketStatus>().map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": "status",
            "value": raw,
            "code": "unknown_status",
            "allowed": TicketStatus::ALL.map(TicketStatus::label),
        }))
    })
}

fn to_responses(tickets: &[Ticket]) -> Vec<TicketResponse> {
    tickets.iter().map(TicketResponse::from).collect()
}

/// Report an incident.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    request_body = NewTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = TicketResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Only citizens report incidents", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "createTicket"
)]
#[post("/tickets")]
pub async fn create_ticket(
    state: web::Data<HttpState>,
    caller: BearerIdentity,
    payload: web::Json<NewTicketRequest>,
) -> ApiResult<HttpResponse> {
    let NewTicketRequest {
        title,
        description,
        category,
    } = payload.into_inner();
    let title_field = FieldName::new("title");
    let title = TicketTitle::new(require(title, title_field)?)
        .map_err(|err| map_ticket_validation(title_field, err))?;
    let description_field = FieldName::new("description");
    let description = TicketDescription::new(require(description, description_field)?)
        .map_err(|err| map_ticket_validation(description_field, err))?;
    let request = CreateTicketRequest {
        title,
        description,
        category_hint: category,
    };
    let ticket = state.tickets.create_ticket(caller.identity(), request).await?;
    Ok(HttpResponse::Created().json(TicketResponse::from(&ticket)))
}

/// Tickets reported by the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/my-tickets",
    responses(
        (status = 200, description = "Own tickets", body = [TicketResponse]),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "listMyTickets"
)]
#[get("/my-tickets")]
pub async fn list_my_tickets(
    state: web::Data<HttpState>,
    caller: BearerIdentity,
) -> ApiResult<web::Json<Vec<TicketResponse>>> {
    let tickets = state.tickets_query.list_mine(caller.identity()).await?;
    Ok(web::Json(to_responses(&tickets)))
}

/// Every ticket by priority, for operators.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    responses(
        (
            status = 200,
            description = "All tickets, highest priority first",
            body = [TicketResponse]
        ),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Operators only", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "listTickets"
)]
#[get("/tickets")]
pub async fn list_tickets(
    state: web::Data<HttpState>,
    caller: BearerIdentity,
) -> ApiResult<web::Json<Vec<TicketResponse>>> {
    let tickets = state.tickets_query.list_all(caller.identity()).await?;
    Ok(web::Json(to_responses(&tickets)))
}

/// Route a ticket to a team.
#[utoipa::path(
    patch,
    path = "/api/v1/tickets/{id}/assign",
    params(("id" = String, Path, description = "Ticket identifier")),
    request_body = AssignTeamRequest,
    responses(
        (status = 200, description = "Ticket assigned", body = TicketResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Operators only", body = ErrorSchema),
        (status = 404, description = "Ticket not found", body = ErrorSchema),
        (status = 409, description = "Ticket no longer accepts assignments", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "assignTeam"
)]
#[patch("/tickets/{id}/assign")]
pub async fn assign_team(
    state: web::Data<HttpState>,
    caller: BearerIdentity,
    path: web::Path<String>,
    payload: web::Json<AssignTeamRequest>,
) -> ApiResult<web::Json<TicketResponse>> {
    let ticket_id = parse_ticket_id(&path.into_inner())?;
    let field = FieldName::new("team");
    let team = TeamName::new(require(payload.into_inner().team, field)?)
        .map_err(|err| map_ticket_validation(field, err))?;
    let ticket = state.tickets.assign_team(caller.identity(), &ticket_id, team).await?;
    Ok(web::Json(TicketResponse::from(&ticket)))
}

/// Move a ticket to its next status.
#[utoipa::path(
    patch,
    path = "/api/v1/tickets/{id}/status",
    params(("id" = String, Path, description = "Ticket identifier")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Status changed", body = TicketResponse),
        (status = 400, description = "Unknown status", body = ErrorSchema),
        (status = 403, description = "Operators only", body = ErrorSchema),
        (status = 404, description = "Ticket not found", body = ErrorSchema),
        (status = 409, description = "Transition not allowed", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "advanceStatus"
)]
#[patch("/tickets/{id}/status")]
pub async fn advance_status(
    state: web::Data<HttpState>,
    caller: BearerIdentity,
    path: web::Path<String>,
    payload: web::Json<StatusRequest>,
) -> ApiResult<web::Json<TicketResponse>> {
    let ticket_id = parse_ticket_id(&path.into_inner())?;
    let raw = require(payload.into_inner().status, FieldName::new("status"))?;
    let target = parse_status(&raw)?;
    let ticket = state
        .tickets
        .advance_status(caller.identity(), &ticket_id, target)
        .await?;
    Ok(web::Json(TicketResponse::from(&ticket)))
}

/// Attach evidence to one of the caller's tickets.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/evidence",
    params(("id" = String, Path, description = "Ticket identifier")),
    request_body = EvidenceRequest,
    responses(
        (status = 201, description = "Evidence attached", body = EvidenceResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Only the reporter may attach evidence", body = ErrorSchema),
        (status = 404, description = "Ticket not found", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "addEvidence"
)]
#[post("/tickets/{id}/evidence")]
pub async fn add_evidence(
    state: web::Data<HttpState>,
    caller: BearerIdentity,
    path: web::Path<String>,
    payload: web::Json<EvidenceRequest>,
) -> ApiResult<HttpResponse> {
    let ticket_id = parse_ticket_id(&path.into_inner())?;
    let EvidenceRequest { image, description } = payload.into_inner();
    let image = require(image, FieldName::new("image"))?;
    let draft =
        EvidenceDraft::try_new(&image, description.as_deref()).map_err(map_evidence_validation)?;
    let evidence = state
        .tickets
        .add_evidence(caller.identity(), &ticket_id, draft)
        .await?;
    Ok(HttpResponse::Created().json(EvidenceResponse::from(&evidence)))
}

#[cfg(test)]
#[path = "tickets_tests.rs"]
mod tests;
