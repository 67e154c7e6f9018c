use axum::http::{header::COOKIE, HeaderMap};

use crate::auth::verify_role_token;
use crate::config::{GateConfig, RoleSource};
use crate::gate::{GateError, RoleClaim};

/// Session state the gate reads from one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInputs {
    pub has_credential: bool,
    pub role: RoleClaim,
}

/// Knows which cookies and headers carry the credential and the role claim.
#[derive(Debug, Clone)]
pub struct SessionReader {
    session_cookie: String,
    session_header: String,
    role_cookie: String,
    role_header: String,
    role_source: RoleSource,
    secret: Option<String>,
}

impl SessionReader {
    pub fn from_config(gate: &GateConfig, secret: Option<&str>) -> Result<Self, GateError> {
        let secret = secret.filter(|s| !s.is_empty()).map(str::to_string);
        if gate.role_source == RoleSource::Signed && secret.is_none() {
            return Err(GateError::MissingSecret);
        }

        Ok(Self {
            session_cookie: gate.session_cookie.clone(),
            session_header: gate.session_header.clone(),
            role_cookie: gate.role_cookie.clone(),
            role_header: gate.role_header.clone(),
            role_source: gate.role_source,
            secret,
        })
    }

    pub fn role_source(&self) -> RoleSource {
        self.role_source
    }

    pub fn read(&self, headers: &HeaderMap) -> SessionInputs {
        SessionInputs {
            has_credential: self.has_credential(headers),
            role: self.role(headers),
        }
    }

    /// The credential is presence-only; an empty value counts as missing and
    /// falls through to the header.
    fn has_credential(&self, headers: &HeaderMap) -> bool {
        let cookie = cookie_carrier(headers, &self.session_cookie);
        let carrier = if cookie.is_blank() {
            header_carrier(headers, &self.session_header)
        } else {
            cookie
        };
        !carrier.is_blank()
    }

    fn role(&self, headers: &HeaderMap) -> RoleClaim {
        let carrier = cookie_carrier(headers, &self.role_cookie)
            .or_else(|| header_carrier(headers, &self.role_header));

        let raw = match carrier {
            Carrier::Missing => return RoleClaim::Absent,
            Carrier::Value(raw) => raw,
            // A role that cannot be read is still a role the caller sent
            Carrier::Unreadable(bytes) => {
                tracing::debug!("Role claim rejected: carrier is not valid UTF-8");
                return match self.role_source {
                    RoleSource::Plain => RoleClaim::Present(String::from_utf8_lossy(bytes).into_owned()),
                    RoleSource::Signed => RoleClaim::Unverified,
                };
            }
        };

        match (self.role_source, self.secret.as_deref()) {
            (RoleSource::Plain, _) => RoleClaim::Present(raw.to_string()),
            (RoleSource::Signed, Some(secret)) => match verify_role_token(raw, secret) {
                Ok(claims) => RoleClaim::Present(claims.role),
                Err(e) => {
                    tracing::debug!("Role claim rejected: {}", e);
                    RoleClaim::Unverified
                }
            },
            (RoleSource::Signed, None) => RoleClaim::Unverified,
        }
    }
}

/// A cookie or header value as found on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Carrier<'a> {
    Missing,
    Value(&'a str),
    /// Sent, but the bytes are not valid UTF-8.
    Unreadable(&'a [u8]),
}

impl<'a> Carrier<'a> {
    fn decode(bytes: &'a [u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(value) => Carrier::Value(value),
            Err(_) => Carrier::Unreadable(bytes),
        }
    }

    fn or_else(self, fallback: impl FnOnce() -> Carrier<'a>) -> Carrier<'a> {
        match self {
            Carrier::Missing => fallback(),
            other => other,
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Carrier::Missing => true,
            Carrier::Value(value) => value.trim().is_empty(),
            Carrier::Unreadable(bytes) => bytes.iter().all(u8::is_ascii_whitespace),
        }
    }
}

/// Find a cookie by name across every `Cookie` header on the request.
///
/// Works on raw bytes so one malformed cookie does not hide the others.
fn cookie_carrier<'a>(headers: &'a HeaderMap, name: &str) -> Carrier<'a> {
    headers
        .get_all(COOKIE)
        .iter()
        .flat_map(|value| value.as_bytes().split(|b| *b == b';'))
        .filter_map(|pair| {
            let pair = trim_by(pair, u8::is_ascii_whitespace);
            let eq = pair.iter().position(|b| *b == b'=')?;
            Some((&pair[..eq], &pair[eq + 1..]))
        })
        .find(|(key, _)| *key == name.as_bytes())
        .map(|(_, value)| Carrier::decode(trim_by(value, |b| *b == b'"')))
        .unwrap_or(Carrier::Missing)
}

fn header_carrier<'a>(headers: &'a HeaderMap, name: &str) -> Carrier<'a> {
    headers
        .get(name)
        .map_or(Carrier::Missing, |value| Carrier::decode(value.as_bytes()))
}

fn trim_by(bytes: &[u8], strip: impl Fn(&u8) -> bool) -> &[u8] {
    let start = bytes.iter().position(|b| !strip(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !strip(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Readable value of a named cookie, if the request carries one.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    match cookie_carrier(headers, name) {
        Carrier::Value(value) => Some(value),
        _ => None,
    }
}
