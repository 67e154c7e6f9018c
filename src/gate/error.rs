use thiserror::Error;

/// Configuration problems detected while building the gate at startup.
///
/// Request-time evaluation never fails; every one of these is raised before
/// the server binds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Invalid {name} '{value}': must start with '/' and name a path below the site root")]
    InvalidPrefix { name: &'static str, value: String },

    #[error("Invalid {name} '{value}': {reason}")]
    InvalidRedirectTarget {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Invalid route pattern '{0}': expected '/prefix' or '/prefix/:name*'")]
    InvalidPattern(String),

    #[error("Gate prefix '{0}' is not covered by any wildcard route pattern")]
    UncoveredPrefix(String),

    #[error("Route pattern '{0}' does not belong to the admin or protected family")]
    UnknownFamily(String),

    #[error("Redirect target '{target}' is itself gated and would loop ({reason})")]
    RedirectLoop { target: String, reason: &'static str },

    #[error("Role source 'signed' requires SECURITY_JWT_SECRET to be set")]
    MissingSecret,
}
