//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on driving ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AuthService, TicketCommand, TicketQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<dyn AuthService>,
    pub tickets: Arc<dyn TicketCommand>,
    pub tickets_query: Arc<dyn TicketQuery>,
}

impl HttpState {
    /// Bundle the driving ports.
    ///
    /// # Examples
    /// ```ignore
    /// let service = Arc::new(TicketServiceImpl::new(store, users, classifier));
    /// let state = HttpState::new(auth, service.clone(), service);
    /// ```
    pub fn new(
        auth: Arc<dyn AuthService>,
        tickets: Arc<dyn TicketCommand>,
        tickets_query: Arc<dyn TicketQuery>,
    ) -> Self {
        Self {
            auth,
            tickets,
            tickets_query,
        }
    }
}
