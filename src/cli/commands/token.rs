use clap::Args;
use serde_json::{json, Value};

use crate::auth::{issue_role_token, verify_role_token, RoleClaims};
use crate::cli::{utils, OutputFormat};
use crate::config::AppConfig;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "Role label to embed, e.g. ADMIN, COORDINADOR, DOCENTE")]
    pub role: String,

    #[arg(long, default_value = "operator", help = "Subject the token is issued to")]
    pub subject: String,

    #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

fn secret(config: &AppConfig) -> anyhow::Result<&str> {
    config
        .security
        .jwt_secret
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("SECURITY_JWT_SECRET is not set"))
}

pub fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let issued = mint(args, config)?;
    utils::output_success(output_format, "Role token issued", Some(issued))
}

/// Signs a role token plus the ready-to-paste cookie that carries it.
pub fn mint(args: TokenArgs, config: &AppConfig) -> anyhow::Result<Value> {
    let hours = args.hours.unwrap_or(config.security.jwt_expiry_hours);
    let claims = RoleClaims::new(args.subject, args.role, hours);
    let token = issue_role_token(&claims, secret(config)?)?;

    Ok(json!({
        "cookie": format!("{}={}", config.gate.role_cookie, token),
        "token": token,
        "role": claims.role,
        "subject": claims.sub,
        "expires_at": claims.exp,
    }))
}

pub fn verify(token: &str, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match verify_role_token(token, secret(config)?) {
        Ok(claims) => utils::output_success(
            output_format,
            "Role token is valid",
            Some(serde_json::to_value(&claims)?),
        ),
        Err(e) => {
            utils::output_error(output_format, &e.to_string(), Some("INVALID_ROLE_TOKEN"))?;
            Err(e.into())
        }
    }
}
