//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

use crate::domain::{Error, MAX_IMAGE_REFERENCE_BYTES};

pub mod auth;
pub mod error;
pub mod health;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tickets;
pub mod users;
pub(crate) mod validation;

pub use error::ApiResult;

/// JSON body limits: the largest evidence image plus envelope slack.
pub const JSON_BODY_LIMIT: usize = MAX_IMAGE_REFERENCE_BYTES + 64 * 1024;

/// JSON extractor configuration shared by every API scope.
///
/// Malformed bodies surface as `invalid_request` with the standard error
/// payload instead of actix's plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            Error::invalid_request(format!("invalid JSON body: {err}")).into()
        })
}
