//! Declarative route matcher.
//!
//! The host router only hands a request to the gate when its path matches one
//! of these patterns. Patterns take two shapes:
//!
//! - `/dashboard` matches that exact path
//! - `/dashboard/:path*` matches `/dashboard` and every nested sub-path
//!
//! The gate keeps its own prefix checks as well; [`RouteMatcher::check_consistency`]
//! makes sure the two never drift apart.

use std::fmt;
use std::str::FromStr;

use super::error::GateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    base: String,
    wildcard: bool,
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, GateError> {
        let trimmed = raw.trim();
        let invalid = || GateError::InvalidPattern(trimmed.to_string());

        if !trimmed.starts_with('/') {
            return Err(invalid());
        }

        let (base, wildcard) = match trimmed.rsplit_once("/:") {
            Some((base, param)) => {
                let name = param.strip_suffix('*').ok_or_else(invalid)?;
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(invalid());
                }
                (base, true)
            }
            None => (trimmed.trim_end_matches('/'), false),
        };

        // Parameters are only allowed as the trailing wildcard segment
        if base.contains(':') || base.contains('*') {
            return Err(invalid());
        }
        if base.is_empty() && !wildcard {
            return Err(invalid());
        }

        Ok(Self {
            raw: trimmed.to_string(),
            base: base.to_string(),
            wildcard,
        })
    }

    /// Literal path the pattern is anchored at, without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn matches(&self, path: &str) -> bool {
        if path == self.base {
            return true;
        }
        if !self.wildcard {
            return false;
        }
        path.strip_prefix(self.base.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl FromStr for RoutePattern {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The set of patterns for which the gate is invoked at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatcher {
    patterns: Vec<RoutePattern>,
}

impl RouteMatcher {
    pub fn new(patterns: Vec<RoutePattern>) -> Self {
        Self { patterns }
    }

    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> Result<Self, GateError> {
        patterns
            .iter()
            .map(|p| RoutePattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Default coverage for a pair of gate prefixes: each prefix plus all of its sub-paths.
    pub fn for_prefixes(admin_prefix: &str, protected_prefix: &str) -> Result<Self, GateError> {
        Self::parse(&[
            format!("{}/:path*", admin_prefix.trim_end_matches('/')),
            format!("{}/:path*", protected_prefix.trim_end_matches('/')),
        ])
    }

    pub fn patterns(&self) -> &[RoutePattern] {
        &self.patterns
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    /// Checks that the matcher covers exactly the two prefix families.
    ///
    /// Every gate prefix needs a wildcard pattern anchored at it, and every
    /// pattern must live inside one of the families.
    pub fn check_consistency(&self, prefixes: &[&str]) -> Result<(), GateError> {
        for prefix in prefixes {
            let anchor = prefix.trim_end_matches('/');
            let covered = self
                .patterns
                .iter()
                .any(|p| p.is_wildcard() && p.base() == anchor);
            if !covered {
                return Err(GateError::UncoveredPrefix(prefix.to_string()));
            }
        }

        for pattern in &self.patterns {
            let inside = prefixes.iter().any(|prefix| pattern.base().starts_with(prefix));
            if !inside {
                return Err(GateError::UnknownFamily(pattern.to_string()));
            }
        }

        Ok(())
    }
}
