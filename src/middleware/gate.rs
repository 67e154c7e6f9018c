use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::config::AppConfig;
use crate::gate::{GateError, RouteGate};

use super::session::SessionReader;

/// Shared, read-only state for the gate middleware.
#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<RouteGate>,
    pub sessions: Arc<SessionReader>,
}

impl GateState {
    pub fn from_config(config: &AppConfig) -> Result<Self, GateError> {
        let gate = RouteGate::from_config(&config.gate)?;
        let sessions = SessionReader::from_config(&config.gate, config.security.jwt_secret.as_deref())?;

        Ok(Self {
            gate: Arc::new(gate),
            sessions: Arc::new(sessions),
        })
    }
}

/// Gate middleware: pass the request on, or answer with a redirect.
///
/// Requests outside the declarative matcher go straight through without
/// touching cookies.
pub async fn route_gate_middleware(
    State(state): State<GateState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if !state.gate.intercepts(path) {
        return next.run(request).await;
    }

    let session = state.sessions.read(request.headers());
    let decision = state.gate.evaluate(path, session.has_credential, &session.role);

    match state.gate.redirect_location(decision) {
        None => next.run(request).await,
        Some(location) => {
            tracing::debug!("Gate redirect: {} -> {} ({:?})", path, location, decision);
            Redirect::temporary(location).into_response()
        }
    }
}
