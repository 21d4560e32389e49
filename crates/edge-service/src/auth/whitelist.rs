//! Paths that bypass token verification.

use crate::config::JwtAuthConfig;

/// Whitelist rules, matched against the request path with the web prefix
/// removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhitelistRules {
    prefix: Vec<String>,
    exact: Vec<String>,
}

impl WhitelistRules {
    /// Build rules, dropping empty entries.
    ///
    /// An empty prefix would match every path, so it is never kept.
    pub fn new(prefix: Vec<String>, exact: Vec<String>) -> Self {
        Self {
            prefix: prefix.into_iter().filter(|p| !p.is_empty()).collect(),
            exact: exact.into_iter().filter(|p| !p.is_empty()).collect(),
        }
    }

    /// Rules in effect for the configured no-token behavior.
    ///
    /// Exact rules are only kept when rejections answer 401; with a redirect
    /// they are ignored.
    pub fn from_config(jwt: &JwtAuthConfig) -> Self {
        let exact = if jwt.no_token_behavior.allows_exact_whitelist() {
            jwt.exact_whitelist_paths.clone()
        } else {
            if !jwt.exact_whitelist_paths.is_empty() {
                tracing::warn!(
                    target: "edge.auth.gate",
                    "JWT_AUTH_EXACT_WHITELIST_PATHS is ignored unless JWT_AUTH_NO_TOKEN_STATUS_CODE is 401"
                );
            }
            Vec::new()
        };
        Self::new(jwt.prefix_whitelist_paths.clone(), exact)
    }

    /// Exact rules first, then prefix rules.
    pub fn matches(&self, effective_path: &str) -> bool {
        self.exact.iter().any(|p| p == effective_path)
            || self
                .prefix
                .iter()
                .any(|p| effective_path.starts_with(p.as_str()))
    }
}

/// The request path with `web_prefix` removed, or unchanged when it does not
/// start with the prefix.
pub fn effective_path<'a>(path: &'a str, web_prefix: &str) -> &'a str {
    if web_prefix.is_empty() {
        return path;
    }
    path.strip_prefix(web_prefix).unwrap_or(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::HashMap;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_prefix_match() {
        let rules = WhitelistRules::new(strings(&["/api/v1/health"]), vec![]);
        assert!(rules.matches("/api/v1/health"));
        assert!(rules.matches("/api/v1/health/live"));
        assert!(!rules.matches("/api/v1/me"));
    }

    #[test]
    fn test_exact_match_only_exact() {
        let rules = WhitelistRules::new(vec![], strings(&["/metrics"]));
        assert!(rules.matches("/metrics"));
        assert!(!rules.matches("/metrics/extra"));
    }

    #[test]
    fn test_empty_rules_are_dropped() {
        let rules = WhitelistRules::new(strings(&["", "/public"]), strings(&[""]));
        assert!(!rules.matches("/private"));
        assert!(!rules.matches(""));
        assert!(rules.matches("/public/x"));
    }

    #[test]
    fn test_from_config_ignores_exact_rules_on_redirect() {
        let vars = HashMap::from([
            ("JWT_AUTH_EXACT_WHITELIST_PATHS".to_string(), "/open".to_string()),
            ("JWT_AUTH_NO_TOKEN_STATUS_CODE".to_string(), "307".to_string()),
        ]);
        let config = Config::from_vars(&vars).unwrap();
        let rules = WhitelistRules::from_config(&config.jwt);
        assert!(!rules.matches("/open"));
    }

    #[test]
    fn test_from_config_uses_exact_rules_on_401() {
        let vars = HashMap::from([
            ("JWT_AUTH_EXACT_WHITELIST_PATHS".to_string(), "/open".to_string()),
            ("JWT_AUTH_NO_TOKEN_STATUS_CODE".to_string(), "401".to_string()),
        ]);
        let config = Config::from_vars(&vars).unwrap();
        let rules = WhitelistRules::from_config(&config.jwt);
        assert!(rules.matches("/open"));
        assert!(rules.matches("/api/v1/health"));
    }

    #[test]
    fn test_effective_path() {
        assert_eq!(effective_path("/edge/api/v1/me", "/edge"), "/api/v1/me");
        assert_eq!(effective_path("/other/api", "/edge"), "/other/api");
        assert_eq!(effective_path("/api", ""), "/api");
    }
}
