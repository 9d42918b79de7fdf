//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, TicketId};

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(self) -> &'static str {
        self.0
    }
}

/// `invalid_request` carrying `{field, code}` details.
pub(crate) fn field_error(field: FieldName, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code,
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(field, "missing_field", format!("missing required field: {name}"))
}

/// Unwrap an optional body field or fail with `missing_field`.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn parse_ticket_id(value: &str) -> Result<TicketId, Error> {
    Uuid::parse_str(value).map(TicketId::from_uuid).map_err(|_| {
        Error::invalid_request("ticket id must be a valid UUID").with_details(json!({
            "field": "id",
            "value": value,
            "code": "invalid_uuid",
        }))
    })
}
