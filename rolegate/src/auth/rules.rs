//! Route rule table: maps a request path to the role requirement that governs it.
//!
//! Rules are evaluated in declared order and the first match wins. The table never reorders
//! rules, so a general pattern declared before a more specific one makes the specific one
//! unreachable (`/admin/**` before `/admin/reports` means the second rule never applies). Such
//! rules are reported with a warning when the table is built.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    errors::Error,
    types::{Role, RoleSet},
};

/// A route rule as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteRuleConfig {
    /// Literal path (`/managers`) or path prefix with a trailing wildcard (`/admin/**`)
    pub pattern: String,
    /// Roles of which the caller must hold at least one. Empty means any authenticated caller.
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// Parsed form of a rule's path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    /// Matches one path, ignoring a trailing slash on the request
    Exact(String),
    /// Matches the prefix itself and everything below it. The prefix has no trailing slash and is
    /// empty for `/**`.
    Subtree(String),
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, Error> {
        if !pattern.starts_with('/') {
            return Err(Error::invalid_config(format!("route pattern '{pattern}' must start with '/'")));
        }

        let wildcard_prefix = pattern.strip_suffix("/**").or_else(|| pattern.strip_suffix("/*"));
        let parsed = match wildcard_prefix {
            Some(prefix) => RoutePattern::Subtree(prefix.to_string()),
            None => RoutePattern::Exact(trim_trailing_slash(pattern).to_string()),
        };

        let literal = match &parsed {
            RoutePattern::Exact(p) | RoutePattern::Subtree(p) => p,
        };
        if literal.contains('*') {
            return Err(Error::invalid_config(format!(
                "route pattern '{pattern}' may only use a wildcard as its final segment"
            )));
        }

        Ok(parsed)
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            RoutePattern::Exact(literal) => trim_trailing_slash(path) == literal,
            RoutePattern::Subtree(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }

    /// True if every path matched by `other` is also matched by `self`.
    fn covers(&self, other: &RoutePattern) -> bool {
        match (self, other) {
            (_, RoutePattern::Exact(literal)) => self.matches(literal),
            (RoutePattern::Exact(_), RoutePattern::Subtree(_)) => false,
            (RoutePattern::Subtree(outer), RoutePattern::Subtree(inner)) => {
                outer.is_empty() || (!inner.is_empty() && self.matches(inner))
            }
        }
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// How a rule's required roles are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The caller must hold at least one of the listed roles
    #[default]
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    /// Pattern as declared, for logs
    pub source: String,
    pub pattern: RoutePattern,
    pub required_roles: RoleSet,
    pub match_mode: MatchMode,
}

impl RouteRule {
    pub fn new(pattern: &str, required_roles: RoleSet) -> Result<Self, Error> {
        Ok(Self {
            source: pattern.to_string(),
            pattern: RoutePattern::parse(pattern)?,
            required_roles,
            match_mode: MatchMode::Any,
        })
    }

    /// The rule applied when no declared rule matches: authentication only.
    pub fn authenticated() -> Self {
        Self {
            source: "/**".to_string(),
            pattern: RoutePattern::Subtree(String::new()),
            required_roles: RoleSet::new(),
            match_mode: MatchMode::Any,
        }
    }

    /// Whether a caller holding `roles` satisfies this rule.
    pub fn permits(&self, roles: &RoleSet) -> bool {
        if self.required_roles.is_empty() {
            return true;
        }
        match self.match_mode {
            MatchMode::Any => !self.required_roles.is_disjoint(roles),
        }
    }
}

/// Ordered list of route rules with an implicit authentication-only fallback.
#[derive(Debug, Clone)]
pub struct RouteRuleTable {
    rules: Vec<RouteRule>,
    default_rule: RouteRule,
}

impl RouteRuleTable {
    pub fn new(rules: Vec<RouteRule>) -> Result<Self, Error> {
        if rules.is_empty() {
            return Err(Error::invalid_config("route rule table must contain at least one rule"));
        }

        for (i, rule) in rules.iter().enumerate() {
            if let Some(earlier) = rules[..i].iter().find(|earlier| earlier.pattern.covers(&rule.pattern)) {
                warn!(
                    "Route rule '{}' is unreachable: it is shadowed by the earlier rule '{}'",
                    rule.source, earlier.source
                );
            }
        }

        Ok(Self {
            rules,
            default_rule: RouteRule::authenticated(),
        })
    }

    pub fn from_config(rules: &[RouteRuleConfig]) -> Result<Self, Error> {
        let rules = rules
            .iter()
            .map(|r| RouteRule::new(&r.pattern, r.roles.iter().cloned().collect()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(rules)
    }

    /// Return the first rule matching `path`, or the default rule.
    pub fn match_path(&self, path: &str) -> &RouteRule {
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .unwrap_or(&self.default_rule);
        debug!("Path {} governed by rule '{}'", path, rule.source);
        rule
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_roles;

    fn default_table() -> RouteRuleTable {
        RouteRuleTable::from_config(&crate::config::Config::default().rules).unwrap()
    }

    #[test]
    fn test_admin_subtree() {
        let table = default_table();

        for path in ["/admin", "/admin/", "/admin/reports", "/admin/reports/2024"] {
            let rule = table.match_path(path);
            assert_eq!(rule.source, "/admin/**", "path {path}");
            assert_eq!(rule.required_roles, parse_roles(["ADMIN"]).unwrap());
        }
    }

    #[test]
    fn test_managers_literal() {
        let table = default_table();

        for path in ["/managers", "/managers/"] {
            let rule = table.match_path(path);
            assert_eq!(rule.source, "/managers", "path {path}");
            assert_eq!(rule.required_roles, parse_roles(["MANAGER", "ADMIN"]).unwrap());
        }
    }

    #[test]
    fn test_other_paths_fall_back_to_authenticated() {
        let table = default_table();

        for path in ["/", "/everyone", "/administrator", "/managers/reports", "/adminx/reports", "/nope"] {
            let rule = table.match_path(path);
            assert_eq!(rule, &RouteRule::authenticated(), "path {path}");
            assert!(rule.required_roles.is_empty());
        }
    }

    #[test]
    fn test_first_match_wins() {
        let table = RouteRuleTable::new(vec![
            RouteRule::new("/admin/**", parse_roles(["ADMIN"]).unwrap()).unwrap(),
            RouteRule::new("/admin/reports", parse_roles(["AUDITOR"]).unwrap()).unwrap(),
        ])
        .unwrap();

        // Declared order is kept even though the second rule is more specific
        assert_eq!(table.match_path("/admin/reports").source, "/admin/**");
        assert_eq!(table.rules().len(), 2);

        let reordered = RouteRuleTable::new(vec![
            RouteRule::new("/admin/reports", parse_roles(["AUDITOR"]).unwrap()).unwrap(),
            RouteRule::new("/admin/**", parse_roles(["ADMIN"]).unwrap()).unwrap(),
        ])
        .unwrap();
        assert_eq!(reordered.match_path("/admin/reports").source, "/admin/reports");
        assert_eq!(reordered.match_path("/admin/users").source, "/admin/**");
    }

    #[test]
    fn test_single_star_is_a_subtree() {
        let pattern = RoutePattern::parse("/admin/*").unwrap();
        assert_eq!(pattern, RoutePattern::Subtree("/admin".to_string()));
        assert!(pattern.matches("/admin/reports"));
        assert!(pattern.matches("/admin/reports/daily"));
    }

    #[test]
    fn test_root_wildcard_matches_everything() {
        let pattern = RoutePattern::parse("/**").unwrap();
        assert!(pattern.matches("/"));
        assert!(pattern.matches("/anything/at/all"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(RoutePattern::parse("admin").is_err());
        assert!(RoutePattern::parse("").is_err());
        assert!(RoutePattern::parse("/ad*min").is_err());
        assert!(RoutePattern::parse("/*/reports").is_err());
        assert!(RoutePattern::parse("/admin/**/x").is_err());
    }

    #[test]
    fn test_empty_table_is_rejected() {
        assert!(RouteRuleTable::new(vec![]).is_err());
        assert!(RouteRuleTable::from_config(&[]).is_err());
    }

    #[test]
    fn test_permits_any_semantics() {
        let rule = RouteRule::new("/managers", parse_roles(["MANAGER", "ADMIN"]).unwrap()).unwrap();

        assert!(rule.permits(&parse_roles(["USER", "MANAGER"]).unwrap()));
        assert!(rule.permits(&parse_roles(["ADMIN"]).unwrap()));
        assert!(!rule.permits(&parse_roles(["USER"]).unwrap()));
        assert!(!rule.permits(&RoleSet::new()));

        assert!(RouteRule::authenticated().permits(&RoleSet::new()));
    }

    #[test]
    fn test_covers() {
        let admin = RoutePattern::parse("/admin/**").unwrap();
        let root = RoutePattern::parse("/**").unwrap();

        assert!(admin.covers(&RoutePattern::parse("/admin/reports").unwrap()));
        assert!(admin.covers(&RoutePattern::parse("/admin/reports/**").unwrap()));
        assert!(admin.covers(&RoutePattern::parse("/admin").unwrap()));
        assert!(!admin.covers(&RoutePattern::parse("/managers").unwrap()));
        assert!(!admin.covers(&root));
        assert!(root.covers(&admin));
        assert!(!RoutePattern::parse("/managers").unwrap().covers(&admin));
    }
}
