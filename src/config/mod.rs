use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::gate::MissingRolePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub gate: GateConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Where the role claim comes from and how far it is trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleSource {
    /// Role carrier holds a server-issued HS256 token; the role is read from its claims.
    #[default]
    Signed,
    /// Role carrier holds the raw role label, taken at face value.
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub admin_prefix: String,
    pub protected_prefix: String,
    pub login_path: String,
    pub landing_path: String,
    /// Declarative matcher patterns; derived from the prefixes when unset.
    pub matcher: Option<Vec<String>>,
    pub session_cookie: String,
    pub session_header: String,
    pub role_cookie: String,
    pub role_header: String,
    pub role_source: RoleSource,
    pub missing_role_policy: MissingRolePolicy,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            admin_prefix: "/dashboard/admin".to_string(),
            protected_prefix: "/dashboard".to_string(),
            login_path: "/".to_string(),
            landing_path: "/dashboard".to_string(),
            matcher: None,
            session_cookie: "token".to_string(),
            session_header: "x-session-token".to_string(),
            role_cookie: "role".to_string(),
            role_header: "x-user-role".to_string(),
            role_source: RoleSource::Signed,
            missing_role_policy: MissingRolePolicy::Allow,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    pub jwt_expiry_hours: u64,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read gate config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse gate config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Gate section as it appears in a `GATE_CONFIG_FILE` document.
#[derive(Debug, Deserialize)]
struct GateFile {
    gate: GateConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then layer the file and specific env vars
        let mut config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };

        if let Some(path) = lookup("GATE_CONFIG_FILE") {
            config.gate = load_gate_file(Path::new(&path))?;
        }

        config.with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Gate overrides
        if let Some(v) = lookup("GATE_ADMIN_PREFIX") {
            self.gate.admin_prefix = v;
        }
        if let Some(v) = lookup("GATE_PROTECTED_PREFIX") {
            self.gate.protected_prefix = v;
        }
        if let Some(v) = lookup("GATE_LOGIN_PATH") {
            self.gate.login_path = v;
        }
        if let Some(v) = lookup("GATE_LANDING_PATH") {
            self.gate.landing_path = v;
        }
        if let Some(v) = lookup("GATE_MATCHER") {
            self.gate.matcher = Some(split_list(&v));
        }
        if let Some(v) = lookup("GATE_SESSION_COOKIE") {
            self.gate.session_cookie = v;
        }
        if let Some(v) = lookup("GATE_SESSION_HEADER") {
            self.gate.session_header = v.to_ascii_lowercase();
        }
        if let Some(v) = lookup("GATE_ROLE_COOKIE") {
            self.gate.role_cookie = v;
        }
        if let Some(v) = lookup("GATE_ROLE_HEADER") {
            self.gate.role_header = v.to_ascii_lowercase();
        }
        if let Some(v) = lookup("GATE_ROLE_SOURCE") {
            self.gate.role_source = match v.trim().to_ascii_lowercase().as_str() {
                "signed" => RoleSource::Signed,
                "plain" => RoleSource::Plain,
                _ => return Err(ConfigError::InvalidValue { key: "GATE_ROLE_SOURCE", value: v }),
            };
        }
        if let Some(v) = lookup("GATE_MISSING_ROLE_POLICY") {
            self.gate.missing_role_policy = match v.trim().to_ascii_lowercase().as_str() {
                "allow" => MissingRolePolicy::Allow,
                "deny" => MissingRolePolicy::Deny,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "GATE_MISSING_ROLE_POLICY",
                        value: v,
                    })
                }
            };
        }

        // API overrides
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Some(v) = lookup("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        Ok(self)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            gate: GateConfig::default(),
            api: ApiConfig {
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: Some("campus-gate-development-secret".to_string()),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            gate: GateConfig::default(),
            api: ApiConfig {
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: None,
                jwt_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            gate: GateConfig::default(),
            api: ApiConfig {
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: None,
                jwt_expiry_hours: 8,
            },
        }
    }
}

fn load_gate_file(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: GateFile = serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.gate)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global config - loaded once at startup by the binaries
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Loads the process configuration on first call and returns the shared copy.
pub fn init() -> Result<&'static AppConfig, ConfigError> {
    CONFIG.get_or_try_init(AppConfig::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.gate, GateConfig::default());
        assert!(config.security.jwt_secret.is_some());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::from_lookup(lookup(&[("APP_ENV", "production")])).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.gate, GateConfig::default());
        assert!(config.security.jwt_secret.is_none());
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn gate_overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GATE_ADMIN_PREFIX", "/admin"),
            ("GATE_PROTECTED_PREFIX", "/panel"),
            ("GATE_LANDING_PATH", "/panel/inicio"),
            ("GATE_MATCHER", "/admin/:path*, /panel/:path*"),
            ("GATE_ROLE_SOURCE", "Plain"),
            ("GATE_MISSING_ROLE_POLICY", "deny"),
            ("GATE_ROLE_HEADER", "X-Role"),
        ]))
        .unwrap();

        assert_eq!(config.gate.admin_prefix, "/admin");
        assert_eq!(config.gate.protected_prefix, "/panel");
        assert_eq!(config.gate.landing_path, "/panel/inicio");
        assert_eq!(
            config.gate.matcher,
            Some(vec!["/admin/:path*".to_string(), "/panel/:path*".to_string()])
        );
        assert_eq!(config.gate.role_source, RoleSource::Plain);
        assert_eq!(config.gate.missing_role_policy, MissingRolePolicy::Deny);
        assert_eq!(config.gate.role_header, "x-role");
    }

    #[test]
    fn unknown_role_source_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("GATE_ROLE_SOURCE", "cookie")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "GATE_ROLE_SOURCE", .. }));
    }

    #[test]
    fn empty_secret_counts_as_unset() {
        let config = AppConfig::from_lookup(lookup(&[("SECURITY_JWT_SECRET", "")])).unwrap();
        assert!(config.security.jwt_secret.is_none());
    }

    #[test]
    fn gate_section_is_read_from_yaml_file() {
        let path = std::env::temp_dir().join(format!("campus-gate-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "gate:\n  admin_prefix: /admin\n  protected_prefix: /dashboard\n  role_source: plain\n",
        )
        .unwrap();

        let config = AppConfig::from_lookup(lookup(&[(
            "GATE_CONFIG_FILE",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.gate.admin_prefix, "/admin");
        assert_eq!(config.gate.role_source, RoleSource::Plain);
        // Fields missing from the file keep their defaults
        assert_eq!(config.gate.role_cookie, "role");
    }

    #[test]
    fn missing_yaml_file_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[(
            "GATE_CONFIG_FILE",
            "/nonexistent/campus-gate.yaml",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
