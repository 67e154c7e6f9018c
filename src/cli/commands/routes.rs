use serde_json::{json, Value};

use crate::cli::{utils, OutputFormat};
use crate::config::AppConfig;
use crate::gate::{AdminRole, GateError, RouteGate};

pub fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match report(config) {
        Ok(fields) => utils::output_success(
            output_format,
            "Route matcher is consistent with the gate prefixes",
            Some(fields),
        ),
        Err(e) => {
            utils::output_error(output_format, &e.to_string(), Some("INVALID_GATE_CONFIG"))?;
            Err(e.into())
        }
    }
}

pub fn report(config: &AppConfig) -> Result<Value, GateError> {
    let gate = RouteGate::from_config(&config.gate)?;
    let patterns: Vec<String> = gate.matcher().patterns().iter().map(|p| p.to_string()).collect();
    let roles: Vec<&str> = AdminRole::ALL.iter().map(|r| r.as_str()).collect();

    Ok(json!({
        "matcher": patterns,
        "admin_prefix": gate.admin_prefix(),
        "protected_prefix": gate.protected_prefix(),
        "login_path": gate.login_path(),
        "landing_path": gate.landing_path(),
        "admin_roles": roles,
        "missing_role_policy": gate.missing_role_policy(),
        "role_source": config.gate.role_source,
    }))
}
