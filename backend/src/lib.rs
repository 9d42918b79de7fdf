//! Municipal incident desk backend.
//!
//! Citizens report incidents and attach evidence; operators triage, assign,
//! and resolve them. The crate is laid out hexagonally: [`domain`] holds the
//! ticket lifecycle and access rules, [`inbound`] adapts HTTP onto the
//! driving ports, and [`outbound`] implements the driven ports.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
