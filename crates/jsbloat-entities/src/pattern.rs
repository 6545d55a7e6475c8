use glob::Pattern;

/// A host pattern from an entity's domain list
#[derive(Debug, Clone)]
pub enum HostPattern {
    /// A domain and all of its subdomains (case-insensitive)
    Domain(String),
    /// Glob pattern match (e.g., *.example.com)
    Glob(Pattern),
}

impl HostPattern {
    /// Parse a host pattern string into a HostPattern
    ///
    /// If the pattern contains '*' or '?', it's treated as a glob pattern.
    /// Otherwise it names a domain, which also covers its subdomains.
    pub fn parse(pattern: &str) -> crate::Result<Self> {
        let pattern_lower = pattern.trim().to_lowercase();
        if pattern_lower.is_empty() {
            return Err(crate::Error::InvalidPattern(
                "empty host pattern".to_string(),
            ));
        }

        if pattern_lower.contains('*') || pattern_lower.contains('?') {
            let glob_pattern = Pattern::new(&pattern_lower).map_err(|e| {
                crate::Error::InvalidPattern(format!("Invalid glob pattern '{}': {}", pattern, e))
            })?;
            Ok(HostPattern::Glob(glob_pattern))
        } else {
            Ok(HostPattern::Domain(
                pattern_lower.trim_start_matches('.').to_string(),
            ))
        }
    }

    /// Check if a hostname matches this pattern
    pub fn matches(&self, hostname: &str) -> bool {
        let hostname_lower = hostname.to_lowercase();
        match self {
            HostPattern::Domain(domain) => {
                hostname_lower == *domain
                    || hostname_lower
                        .strip_suffix(domain.as_str())
                        .is_some_and(|rest| rest.ends_with('.'))
            }
            HostPattern::Glob(pattern) => pattern.matches(&hostname_lower),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_matches_subdomains() {
        let pattern = HostPattern::parse("google-analytics.com").unwrap();
        assert!(pattern.matches("google-analytics.com"));
        assert!(pattern.matches("www.google-analytics.com"));
        assert!(pattern.matches("SSL.Google-Analytics.com")); // Case-insensitive
        assert!(!pattern.matches("notgoogle-analytics.com"));
        assert!(!pattern.matches("google-analytics.com.evil.net"));
    }

    #[test]
    fn test_glob_wildcard_prefix() {
        let pattern = HostPattern::parse("*.example.com").unwrap();
        assert!(pattern.matches("api.example.com"));
        assert!(pattern.matches("API.EXAMPLE.COM"));
        assert!(!pattern.matches("example.com")); // No subdomain
        assert!(!pattern.matches("api.different.com"));
    }

    #[test]
    fn test_glob_question_mark() {
        let pattern = HostPattern::parse("cdn?.example.com").unwrap();
        assert!(pattern.matches("cdn1.example.com"));
        assert!(!pattern.matches("cdn.example.com"));
        assert!(!pattern.matches("cdn12.example.com"));
    }

    #[test]
    fn test_leading_dot_is_ignored() {
        let pattern = HostPattern::parse(".example.com").unwrap();
        assert!(pattern.matches("example.com"));
        assert!(pattern.matches("a.example.com"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(HostPattern::parse("").is_err());
        assert!(HostPattern::parse("*.[example.com").is_err());
    }
}
