//! Bearer token extraction for HTTP handlers.
//!
//! The `Authorization` header is resolved once per request through
//! [`AuthService::authenticate`]; handlers only ever see the resulting
//! [`Identity`].

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, Identity};
use crate::inbound::http::state::HttpState;

const BEARER_SCHEME: &str = "bearer";

/// Authenticated caller resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct BearerIdentity(pub Identity);

impl BearerIdentity {
    /// The resolved identity.
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

/// Token portion of an `Authorization: Bearer <token>` header value.
pub(crate) fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty()).then_some(token)
}

impl FromRequest for BearerIdentity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_owned);

        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let token = token.ok_or_else(|| Error::unauthorized("bearer token required"))?;
            let identity = state.auth.authenticate(&token).await.inspect_err(|err| {
                warn!(code = ?err.code(), "bearer token rejected");
            })?;
            Ok(Self(identity))
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Bearer v1.abc.def", Some("v1.abc.def"))]
    #[case("bearer   v1.abc.def  ", Some("v1.abc.def"))]
    #[case("Basic dXNlcjpwYXNz", None)]
    #[case("Bearer ", None)]
    #[case("v1.abc.def", None)]
    fn bearer_token_parsing(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(bearer_token(header), expected);
    }
}
