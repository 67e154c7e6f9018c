//! Host application around the gate.
//!
//! Pages themselves belong to the dashboard front end; this router only
//! answers with small JSON placeholders so the gate can be exercised end to end.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method},
    middleware,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::gate::{GateError, HEALTH_PATH};
use crate::middleware::{route_gate_middleware, GateState};

pub fn app(config: &AppConfig) -> Result<Router, GateError> {
    let state = GateState::from_config(config)?;

    let mut router = Router::new()
        .route("/", get(entry_point))
        .route(HEALTH_PATH, get(health));

    if state.gate.login_path() != "/" {
        router = router.route(state.gate.login_path(), get(entry_point));
    }

    // Gated areas are served by the fallback so nested admin and protected
    // prefixes never collide in the route table.
    let mut router = router
        .fallback(area_page)
        .layer(middleware::from_fn_with_state(state.clone(), route_gate_middleware))
        .with_state(state);

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    Ok(router)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_credentials(true)
}

async fn entry_point(State(state): State<GateState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Campus Gate",
            "version": version,
            "page": "login",
            "areas": {
                "protected": state.gate.protected_prefix(),
                "admin": state.gate.admin_prefix(),
                "landing": state.gate.landing_path(),
            }
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}

/// Placeholder for pages inside the gated areas; anything else is a 404.
async fn area_page(State(state): State<GateState>, request: Request) -> impl IntoResponse {
    let path = request.uri().path();
    let class = state.gate.classify(path);

    if !class.is_gated() || !state.gate.intercepts(path) {
        return ApiError::not_found(format!("No page at {}", path)).into_response();
    }
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return ApiError::method_not_allowed(format!("{} is not allowed on {}", request.method(), path))
            .into_response();
    }

    let area = if class.admin { "admin" } else { "protected" };
    Json(json!({
        "success": true,
        "data": {
            "area": area,
            "path": path,
        }
    }))
    .into_response()
}
