//! Route gate: decides, before a protected page renders, whether the caller
//! may see it.
//!
//! The decision is a pure function of the requested path, whether a session
//! credential was presented, and the role claim that came with it. Nothing is
//! cached between requests, so a single [`RouteGate`] is shared read-only by
//! every in-flight request.

pub mod error;
pub mod matcher;

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

use crate::config::GateConfig;

pub use error::GateError;
pub use matcher::{RouteMatcher, RoutePattern};

/// Liveness route served by the host; no redirect target may take it over.
pub const HEALTH_PATH: &str = "/health";

/// Roles allowed into the administrative area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRole {
    Admin,
    Coordinador,
}

impl AdminRole {
    pub const ALL: [AdminRole; 2] = [AdminRole::Admin, AdminRole::Coordinador];

    /// Normalizes the claim to upper case and matches it against the accepted roles.
    pub fn parse(claim: &str) -> Option<Self> {
        match claim.to_uppercase().as_str() {
            "ADMIN" => Some(AdminRole::Admin),
            "COORDINADOR" => Some(AdminRole::Coordinador),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => "ADMIN",
            AdminRole::Coordinador => "COORDINADOR",
        }
    }
}

/// Role claim as seen by the gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleClaim {
    /// No role carrier on the request.
    Absent,
    /// A role value, already verified when the deployment requires signed claims.
    Present(String),
    /// A role carrier was sent but did not verify. Never grants admin access.
    Unverified,
}

/// What to do with an authenticated caller on an admin route who sent no role claim.
///
/// `Allow` keeps the long-standing behavior of letting the request through.
/// `Deny` sends the caller to the landing page instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingRolePolicy {
    #[default]
    Allow,
    Deny,
}

/// Family membership for a path. Both flags are computed independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteClass {
    pub admin: bool,
    pub protected: bool,
}

impl RouteClass {
    pub fn is_gated(&self) -> bool {
        self.admin || self.protected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Pass,
    RedirectToLogin,
    RedirectToLanding,
}

impl GateDecision {
    pub fn is_redirect(&self) -> bool {
        !matches!(self, GateDecision::Pass)
    }
}

#[derive(Debug, Clone)]
pub struct RouteGate {
    admin_prefix: String,
    protected_prefix: String,
    login_path: String,
    landing_path: String,
    missing_role: MissingRolePolicy,
    matcher: RouteMatcher,
}

impl RouteGate {
    /// Builds the gate and checks it against its declarative matcher.
    pub fn from_config(config: &GateConfig) -> Result<Self, GateError> {
        let admin_prefix = validate_prefix("admin prefix", &config.admin_prefix)?;
        let protected_prefix = validate_prefix("protected prefix", &config.protected_prefix)?;

        let matcher = match &config.matcher {
            Some(patterns) => RouteMatcher::parse(patterns)?,
            None => RouteMatcher::for_prefixes(&admin_prefix, &protected_prefix)?,
        };
        matcher.check_consistency(&[admin_prefix.as_str(), protected_prefix.as_str()])?;

        let gate = Self {
            admin_prefix,
            protected_prefix,
            login_path: validate_target("login path", &config.login_path)?,
            landing_path: validate_target("landing path", &config.landing_path)?,
            missing_role: config.missing_role_policy,
            matcher,
        };

        if gate.classify(&gate.login_path).is_gated() {
            return Err(GateError::RedirectLoop {
                target: gate.login_path.clone(),
                reason: "login path is inside a gated family",
            });
        }
        if gate.classify(&gate.landing_path).admin {
            return Err(GateError::RedirectLoop {
                target: gate.landing_path.clone(),
                reason: "landing path is inside the admin family",
            });
        }

        Ok(gate)
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        RouteClass {
            admin: path.starts_with(&self.admin_prefix),
            protected: path.starts_with(&self.protected_prefix),
        }
    }

    /// Whether the host router hands this path to the gate at all.
    pub fn intercepts(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    /// Decision as the host applies it: paths outside the matcher are never
    /// handed to the gate and always pass.
    pub fn evaluate(&self, path: &str, has_credential: bool, role: &RoleClaim) -> GateDecision {
        if !self.intercepts(path) {
            return GateDecision::Pass;
        }
        self.decide(path, has_credential, role)
    }

    pub fn decide(&self, path: &str, has_credential: bool, role: &RoleClaim) -> GateDecision {
        let class = self.classify(path);
        if !class.is_gated() {
            return GateDecision::Pass;
        }

        // Unauthenticated callers are never evaluated for role
        if !has_credential {
            return GateDecision::RedirectToLogin;
        }

        if class.admin {
            let allowed = match role {
                RoleClaim::Present(value) => AdminRole::parse(value).is_some(),
                RoleClaim::Unverified => false,
                RoleClaim::Absent => self.missing_role == MissingRolePolicy::Allow,
            };
            if !allowed {
                return GateDecision::RedirectToLanding;
            }
        }

        GateDecision::Pass
    }

    pub fn redirect_location(&self, decision: GateDecision) -> Option<&str> {
        match decision {
            GateDecision::Pass => None,
            GateDecision::RedirectToLogin => Some(&self.login_path),
            GateDecision::RedirectToLanding => Some(&self.landing_path),
        }
    }

    pub fn admin_prefix(&self) -> &str {
        &self.admin_prefix
    }

    pub fn protected_prefix(&self) -> &str {
        &self.protected_prefix
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    pub fn missing_role_policy(&self) -> MissingRolePolicy {
        self.missing_role
    }

    pub fn matcher(&self) -> &RouteMatcher {
        &self.matcher
    }
}

fn validate_prefix(name: &'static str, value: &str) -> Result<String, GateError> {
    let trimmed = value.trim().trim_end_matches('/');
    if !trimmed.starts_with('/') || trimmed.contains(':') || trimmed.contains('*') {
        return Err(GateError::InvalidPrefix {
            name,
            value: value.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Login and landing paths end up both in the route table and in `Location`.
fn validate_target(name: &'static str, value: &str) -> Result<String, GateError> {
    let trimmed = value.trim();
    let invalid = |reason| GateError::InvalidRedirectTarget {
        name,
        value: value.to_string(),
        reason,
    };

    if !trimmed.starts_with('/') || trimmed.starts_with("//") {
        return Err(invalid("must be a site-relative path starting with a single '/'"));
    }
    if trimmed.contains([':', '*', '?', '#']) {
        return Err(invalid("must not contain ':', '*', '?' or '#'"));
    }
    if HeaderValue::from_str(trimmed).is_err() {
        return Err(invalid("must be a valid header value"));
    }
    if trimmed.trim_end_matches('/') == HEALTH_PATH {
        return Err(invalid("collides with the health route"));
    }
    Ok(trimmed.to_string())
}
