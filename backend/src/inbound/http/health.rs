//! Orchestrator health checks.
//!
//! The process moves through [`HealthPhase::Starting`], [`HealthPhase::Serving`]
//! and [`HealthPhase::Draining`], never backwards. Readiness holds only while
//! serving. Liveness holds until draining begins, which the server does when
//! it receives a shutdown signal.

use std::sync::atomic::{AtomicU8, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use utoipa::ToSchema;

/// Lifecycle phase reported by the health checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthPhase {
    /// Adapters are being wired; no traffic yet.
    Starting,
    /// Listener bound and accepting requests.
    Serving,
    /// Shutdown requested; in-flight requests are finishing.
    Draining,
}

impl HealthPhase {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Starting,
            1 => Self::Serving,
            _ => Self::Draining,
        }
    }

    fn raw(self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Serving => 1,
            Self::Draining => 2,
        }
    }
}

/// Health check response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    pub phase: HealthPhase,
}

/// Shared health state, starting in [`HealthPhase::Starting`].
#[derive(Debug)]
pub struct HealthState {
    phase: AtomicU8,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            phase: AtomicU8::new(HealthPhase::Starting.raw()),
        }
    }
}

impl HealthState {
    /// Create health state for a process that has not bound its listener yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> HealthPhase {
        HealthPhase::from_raw(self.phase.load(Ordering::Acquire))
    }

    /// Start passing readiness. Has no effect once draining has begun.
    pub fn begin_serving(&self) {
        let _ = self.phase.compare_exchange(
            HealthPhase::Starting.raw(),
            HealthPhase::Serving.raw(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Fail both checks from now on.
    pub fn begin_drain(&self) {
        self.phase.store(HealthPhase::Draining.raw(), Ordering::Release);
    }

    /// Whether the readiness check passes.
    pub fn is_ready(&self) -> bool {
        self.phase() == HealthPhase::Serving
    }

    /// Whether the liveness check passes.
    pub fn is_alive(&self) -> bool {
        self.phase() != HealthPhase::Draining
    }

    fn report(&self, passing: bool) -> HttpResponse {
        let mut response = if passing {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };
        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .json(HealthReport {
                phase: self.phase(),
            })
    }
}

/// Readiness check.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Serving traffic", body = HealthReport),
        (status = 503, description = "Starting or draining", body = HealthReport)
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    state.report(state.is_ready())
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Process is up", body = HealthReport),
        (status = 503, description = "Shutting down", body = HealthReport)
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    state.report(state.is_alive())
}
