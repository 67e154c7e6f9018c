use clap::Args;
use serde_json::{json, Value};

use crate::auth::verify_role_token;
use crate::cli::{utils, OutputFormat};
use crate::config::AppConfig;
use crate::gate::{RoleClaim, RouteGate};

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(help = "Request path, e.g. /dashboard/cursos/123")]
    pub path: String,

    #[arg(long, help = "Session credential value (presence is all that matters)")]
    pub credential: Option<String>,

    #[arg(long, conflicts_with = "role_token", help = "Role claim as an already trusted label")]
    pub role: Option<String>,

    #[arg(long, help = "Role claim as a signed token, verified with the configured secret")]
    pub role_token: Option<String>,
}

pub fn handle(args: CheckArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let (summary, report) = evaluate(&args, config)?;
    utils::output_success(output_format, &summary, Some(report))
}

/// Decision for `args.path` exactly as the running middleware would take it.
pub fn evaluate(args: &CheckArgs, config: &AppConfig) -> anyhow::Result<(String, Value)> {
    let gate = RouteGate::from_config(&config.gate)?;

    let has_credential = args
        .credential
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    let role = match (&args.role, &args.role_token) {
        (Some(label), _) => RoleClaim::Present(label.clone()),
        (None, Some(token)) => {
            let secret = config.security.jwt_secret.as_deref().unwrap_or_default();
            match verify_role_token(token, secret) {
                Ok(claims) => RoleClaim::Present(claims.role),
                Err(e) => {
                    tracing::warn!("Role token did not verify: {}", e);
                    RoleClaim::Unverified
                }
            }
        }
        (None, None) => RoleClaim::Absent,
    };

    let class = gate.classify(&args.path);
    let decision = gate.evaluate(&args.path, has_credential, &role);
    let location = gate.redirect_location(decision);

    let role_label = match &role {
        RoleClaim::Absent => "absent".to_string(),
        RoleClaim::Present(value) => format!("present ({:?})", value),
        RoleClaim::Unverified => "unverified".to_string(),
    };

    let summary = format!("{} -> {}", args.path, location.unwrap_or("pass"));
    let report = json!({
        "path": args.path,
        "intercepted": gate.intercepts(&args.path),
        "admin_route": class.admin,
        "protected_route": class.protected,
        "credential": has_credential,
        "role": role_label,
        "decision": decision,
        "redirect": decision.is_redirect(),
        "location": location,
    });
    Ok((summary, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{issue_role_token, RoleClaims};

    const SECRET: &str = "check-test-secret";

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .chain([("SECURITY_JWT_SECRET".to_string(), SECRET.to_string())])
            .collect();
        AppConfig::from_lookup(|key| {
            vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    fn args(path: &str, credential: Option<&str>, role: Option<&str>) -> CheckArgs {
        CheckArgs {
            path: path.to_string(),
            credential: credential.map(str::to_string),
            role: role.map(str::to_string),
            role_token: None,
        }
    }

    #[test]
    fn reports_decision_and_location() {
        let config = config(&[]);

        let (summary, report) = evaluate(&args("/dashboard/admin/usuarios", Some("s"), Some("docente")), &config).unwrap();
        assert_eq!(summary, "/dashboard/admin/usuarios -> /dashboard");
        assert_eq!(report["decision"], "redirect_to_landing");
        assert_eq!(report["location"], "/dashboard");
        assert_eq!(report["admin_route"], true);
        assert_eq!(report["redirect"], true);

        let (_, report) = evaluate(&args("/dashboard/cursos", None, None), &config).unwrap();
        assert_eq!(report["decision"], "redirect_to_login");
        assert_eq!(report["location"], "/");

        let (summary, report) = evaluate(&args("/dashboard/admin", Some("s"), Some("Coordinador")), &config).unwrap();
        assert_eq!(summary, "/dashboard/admin -> pass");
        assert_eq!(report["decision"], "pass");
        assert_eq!(report["location"], Value::Null);
    }

    #[test]
    fn paths_outside_the_matcher_pass() {
        let config = config(&[("GATE_ADMIN_PREFIX", "/admin"), ("GATE_LANDING_PATH", "/dashboard")]);
        let (summary, report) = evaluate(&args("/administracion", None, None), &config).unwrap();
        assert_eq!(summary, "/administracion -> pass");
        assert_eq!(report["intercepted"], false);
        assert_eq!(report["admin_route"], true);
        assert_eq!(report["decision"], "pass");
        assert_eq!(report["redirect"], false);
    }

    #[test]
    fn role_token_is_verified_with_configured_secret() {
        let mut check = args("/dashboard/admin", Some("s"), None);

        check.role_token = Some(issue_role_token(&RoleClaims::new("t", "ADMIN", 1), SECRET).unwrap());
        let (_, report) = evaluate(&check, &config(&[])).unwrap();
        assert_eq!(report["role"], "present (\"ADMIN\")");
        assert_eq!(report["decision"], "pass");

        check.role_token = Some(issue_role_token(&RoleClaims::new("t", "ADMIN", 1), "other-secret").unwrap());
        let (_, report) = evaluate(&check, &config(&[])).unwrap();
        assert_eq!(report["role"], "unverified");
        assert_eq!(report["location"], "/dashboard");
    }

    #[test]
    fn invalid_gate_config_is_an_error() {
        let config = config(&[("GATE_LOGIN_PATH", "login")]);
        assert!(evaluate(&args("/dashboard", None, None), &config).is_err());
    }
}
