//! Registry scope strings
//!
//! A scope is `<type>:<name>:<actions>`, e.g. `repository:acme/web:pull`.
//! Authorization compares whole scope strings; the structured form exists
//! only to build the `access` claim of a registry token.

use serde::{Deserialize, Serialize};

/// Scope granting pull access to one application's repository
pub fn pull_scope(workspace_slug: &str, app_slug: &str) -> String {
    format!("repository:{}/{}:pull", workspace_slug, app_slug)
}

/// Exact, case-sensitive comparison.
///
/// No prefix, wildcard or normalization: a token minted for one repository
/// must never authorize a similarly named one.
pub fn scopes_match(token_scope: &str, requested_scope: &str) -> bool {
    token_scope == requested_scope
}

/// Structured form of a single scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceScope {
    /// Resource type, normally `repository`
    pub resource_type: String,
    /// Resource name; may contain ':' (registry host with port)
    pub name: String,
    pub actions: Vec<String>,
}

impl ResourceScope {
    /// Split on the first and last ':'. Returns `None` if any part is empty.
    pub fn parse(scope: &str) -> Option<Self> {
        let (resource_type, rest) = scope.split_once(':')?;
        let (name, actions) = rest.rsplit_once(':')?;

        if resource_type.is_empty() || name.is_empty() || actions.is_empty() {
            return None;
        }

        let actions: Vec<String> = actions.split(',').map(str::to_string).collect();
        if actions.iter().any(String::is_empty) {
            return None;
        }

        Some(Self {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_scope_format() {
        assert_eq!(pull_scope("acme", "web"), "repository:acme/web:pull");
    }

    #[test]
    fn test_exact_match() {
        assert!(scopes_match("repository:a/b:pull", "repository:a/b:pull"));
        assert!(!scopes_match("repository:a/b:pull", "repository:a/c:pull"));
    }

    #[test]
    fn test_no_soft_matching() {
        let token = "repository:a/b:pull";
        assert!(!scopes_match(token, "repository:a/b-other:pull"));
        assert!(!scopes_match(token, "repository:a/b:pull,push"));
        assert!(!scopes_match(token, "repository:A/b:pull"));
        assert!(!scopes_match(token, "repository:a/b:pull "));
        assert!(!scopes_match(token, "repository:a/*:pull"));
        assert!(!scopes_match(token, "repository:a/b:pull repository:a/c:pull"));
    }

    #[test]
    fn test_parse_scope() {
        let scope = ResourceScope::parse("repository:acme/web:pull").unwrap();
        assert_eq!(scope.resource_type, "repository");
        assert_eq!(scope.name, "acme/web");
        assert_eq!(scope.actions, vec!["pull"]);
    }

    #[test]
    fn test_parse_scope_with_port_and_actions() {
        let scope = ResourceScope::parse("repository:host:5000/acme/web:pull,push").unwrap();
        assert_eq!(scope.name, "host:5000/acme/web");
        assert_eq!(scope.actions, vec!["pull", "push"]);
    }

    #[test]
    fn test_parse_scope_rejects_incomplete() {
        assert!(ResourceScope::parse("repository").is_none());
        assert!(ResourceScope::parse("repository:acme").is_none());
        assert!(ResourceScope::parse(":acme/web:pull").is_none());
        assert!(ResourceScope::parse("repository::pull").is_none());
        assert!(ResourceScope::parse("repository:acme/web:").is_none());
        assert!(ResourceScope::parse("repository:acme/web:pull,").is_none());
    }
}
