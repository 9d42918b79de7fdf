//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::load_settings;

use config::AppSettings;
use state_builders::{StateInputs, build_http_state};

use std::future::Future;

use actix_web::dev::{Server, ServerHandle, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::{error, info};

use vita_backend::Trace;
#[cfg(debug_assertions)]
use vita_backend::doc::ApiDoc;
use vita_backend::inbound::http::health::{HealthState, live, ready};
use vita_backend::inbound::http::json_config;
use vita_backend::inbound::http::state::HttpState;
use vita_backend::inbound::http::tickets::{
    add_evidence, advance_status, assign_team, create_ticket, list_my_tickets, list_tickets,
};
use vita_backend::inbound::http::users::{current_user, login, register};
use vita_backend::outbound::persistence::DbPool;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .service(register)
        .service(login)
        .service(current_user)
        .service(create_ticket)
        .service(list_my_tickets)
        .service(list_tickets)
        .service(assign_team)
        .service(advance_status)
        .service(add_evidence);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Resolve on SIGINT, or on SIGTERM where the platform has it.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            interrupted = tokio::signal::ctrl_c() => interrupted,
            _ = terminate.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Wait for `signal`, then fail the health checks and stop the server gracefully.
async fn drain_on<F>(health_state: web::Data<HealthState>, handle: ServerHandle, signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!(error = %e, "shutdown signal listener failed");
        return;
    }
    info!("shutdown signal received; draining");
    health_state.begin_drain();
    handle.stop(true).await;
}

/// Construct an Actix HTTP server from loaded settings.
///
/// Diesel adapters back the services when `pool` is present; otherwise the
/// process keeps state in memory. Shutdown signals are handled here rather
/// than by actix so liveness fails before in-flight requests finish. Must be
/// called inside an actix runtime.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    settings: AppSettings,
    pool: Option<DbPool>,
) -> std::io::Result<Server> {
    let AppSettings {
        bind_addr,
        database_url: _,
        token_secret,
        token_ttl,
    } = settings;
    let http_state = web::Data::new(build_http_state(
        pool.as_ref(),
        StateInputs {
            token_secret,
            token_ttl,
        },
    ));

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || build_app(server_health_state.clone(), http_state.clone()))
        .bind(bind_addr)?
        .disable_signals()
        .run();

    health_state.begin_serving();
    actix_web::rt::spawn(drain_on(health_state, server.handle(), shutdown_signal()));
    Ok(server)
}
