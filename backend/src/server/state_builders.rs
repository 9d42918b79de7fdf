//! Builders wiring driven adapters into the HTTP state.

use std::sync::Arc;

use chrono::Duration;
use mockable::{Clock, DefaultClock};
use zeroize::Zeroizing;

use vita_backend::domain::ports::{TicketRepository, UserRepository};
use vita_backend::domain::{AuthServiceImpl, KeywordClassifier, TicketServiceImpl, TicketStore};
use vita_backend::inbound::http::state::HttpState;
use vita_backend::outbound::memory::{InMemoryTicketRepository, InMemoryUserRepository};
use vita_backend::outbound::persistence::{DbPool, DieselTicketRepository, DieselUserRepository};
use vita_backend::outbound::security::{Argon2PasswordHasher, HmacSessionTokens};

/// Adapter-independent inputs shared by every wiring.
pub(crate) struct StateInputs {
    pub token_secret: Zeroizing<Vec<u8>>,
    pub token_ttl: Duration,
}

fn wire<U, T>(users: Arc<U>, tickets: Arc<T>, inputs: StateInputs) -> HttpState
where
    U: UserRepository + 'static,
    T: TicketRepository + 'static,
{
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let auth = AuthServiceImpl::new(
        Arc::clone(&users),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(HmacSessionTokens::new(inputs.token_secret)),
        Arc::clone(&clock),
    )
    .with_token_ttl(inputs.token_ttl);
    let store = TicketStore::new(tickets, clock);
    let service = Arc::new(TicketServiceImpl::new(
        store,
        users,
        Arc::new(KeywordClassifier),
    ));
    HttpState::new(Arc::new(auth), service.clone(), service)
}

/// Build the HTTP state, using Diesel adapters when a pool is available and
/// the in-memory adapters otherwise.
pub(crate) fn build_http_state(pool: Option<&DbPool>, inputs: StateInputs) -> HttpState {
    match pool {
        Some(pool) => wire(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselTicketRepository::new(pool.clone())),
            inputs,
        ),
        None => wire(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryTicketRepository::new()),
            inputs,
        ),
    }
}
