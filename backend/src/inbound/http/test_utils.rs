//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use argon2::Params;
use mockable::DefaultClock;
use zeroize::Zeroizing;

use crate::domain::{AuthServiceImpl, KeywordClassifier, TicketServiceImpl, TicketStore};
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::{InMemoryTicketRepository, InMemoryUserRepository};
use crate::outbound::security::{Argon2PasswordHasher, HmacSessionTokens};

/// Fully wired in-memory state with cheap Argon2 parameters.
pub fn in_memory_state() -> HttpState {
    let users = Arc::new(InMemoryUserRepository::new());
    let clock = Arc::new(DefaultClock);
    let params = Params::new(64, 1, 1, None).expect("valid test Argon2 params");
    let auth = AuthServiceImpl::new(
        Arc::clone(&users),
        Arc::new(Argon2PasswordHasher::with_params(params)),
        Arc::new(HmacSessionTokens::new(Zeroizing::new(vec![7_u8; 32]))),
        clock.clone(),
    );
    let store = TicketStore::new(Arc::new(InMemoryTicketRepository::new()), clock);
    let tickets = Arc::new(TicketServiceImpl::new(store, users, Arc::new(KeywordClassifier)));
    HttpState::new(Arc::new(auth), tickets.clone(), tickets)
}
