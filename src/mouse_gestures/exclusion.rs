//! Per-page exclusion rules.
//!
//! Rules come from the `excludedUrls` setting, one per line:
//!
//! * `example.com` matches the host and every subdomain of it.
//! * `*://*.example.com/*` is a glob over the full URL.
//! * `re:^https://intranet\.` is a regular expression over the full URL.
//!
//! Blank lines and `#` comments are ignored. Patterns are compiled once when
//! the list is built; a pattern that fails to compile never matches.

use regex::{Regex, RegexBuilder};
use url::Url;

pub const REGEX_PREFIX: &str = "re:";
pub const COMMENT_PREFIX: char = '#';

#[derive(Debug, Clone)]
pub enum ExclusionRule {
    Domain(String),
    Wildcard {
        pattern: String,
        matcher: Option<Regex>,
    },
    Regex {
        pattern: String,
        matcher: Option<Regex>,
    },
}

impl ExclusionRule {
    /// Classify one rule line. Returns `None` for blank lines and comments.
    pub fn parse(line: &str) -> Option<Self> {
        let rule = line.trim();
        if rule.is_empty() || rule.starts_with(COMMENT_PREFIX) {
            return None;
        }

        if let Some(pattern) = rule.strip_prefix(REGEX_PREFIX) {
            let matcher = compile_case_insensitive(pattern);
            if matcher.is_none() {
                tracing::warn!(rule, "exclusion regex does not compile; rule ignored");
            }
            return Some(ExclusionRule::Regex {
                pattern: pattern.to_string(),
                matcher,
            });
        }

        if !rule.contains('*') && !rule.contains("://") && !rule.contains('/') {
            return Some(ExclusionRule::Domain(rule.to_ascii_lowercase()));
        }

        let matcher = compile_case_insensitive(&wildcard_to_regex(rule));
        if matcher.is_none() {
            tracing::warn!(rule, "exclusion wildcard does not compile; rule ignored");
        }
        Some(ExclusionRule::Wildcard {
            pattern: rule.to_string(),
            matcher,
        })
    }

    pub fn matches(&self, url: &str, host: &str) -> bool {
        match self {
            ExclusionRule::Domain(domain) => host_matches_domain(host, domain),
            ExclusionRule::Wildcard { matcher, .. } | ExclusionRule::Regex { matcher, .. } => {
                matcher.as_ref().map(|re| re.is_match(url)).unwrap_or(false)
            }
        }
    }

    /// Rule text as the user wrote it (domains are lower-cased).
    pub fn source(&self) -> String {
        match self {
            ExclusionRule::Domain(domain) => domain.clone(),
            ExclusionRule::Wildcard { pattern, .. } => pattern.clone(),
            ExclusionRule::Regex { pattern, .. } => format!("{REGEX_PREFIX}{pattern}"),
        }
    }
}

fn host_matches_domain(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    if host == domain {
        return true;
    }
    host.len() > domain.len()
        && host.ends_with(domain)
        && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
}

fn wildcard_to_regex(pattern: &str) -> String {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("^{body}$")
}

fn compile_case_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

/// Ordered, pre-classified rule list for one page evaluation.
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    rules: Vec<ExclusionRule>,
}

impl ExclusionList {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = lines
            .into_iter()
            .filter_map(|line| ExclusionRule::parse(line.as_ref()))
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule matching the page, in list order.
    pub fn first_match(&self, url: &str, host: &str) -> Option<&ExclusionRule> {
        self.rules.iter().find(|rule| rule.matches(url, host))
    }

    pub fn is_excluded(&self, url: &str, host: &str) -> bool {
        self.first_match(url, host).is_some()
    }

    /// Like [`is_excluded`](Self::is_excluded) but derives the host from `url`.
    /// An unparseable URL has no host, so only URL patterns can match it.
    pub fn is_url_excluded(&self, url: &str) -> bool {
        let host = host_of(url).unwrap_or_default();
        self.is_excluded(url, &host)
    }
}

pub fn is_excluded<S: AsRef<str>>(url: &str, host: &str, rules: &[S]) -> bool {
    rules
        .iter()
        .filter_map(|line| ExclusionRule::parse(line.as_ref()))
        .any(|rule| rule.matches(url, host))
}

pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

fn excludable_url(url: &str) -> Option<Url> {
    let parsed = Url::parse(url).ok()?;
    match parsed.scheme() {
        "http" | "https" | "file" => Some(parsed),
        _ => None,
    }
}

/// Rule excluding the whole site of `url`: its bare hostname.
pub fn site_rule(url: &str) -> Option<String> {
    excludable_url(url)?
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

/// Rule excluding exactly this page.
///
/// A full URL contains `/`, so it is classified as a wildcard pattern without
/// any `*` and therefore only matches itself.
pub fn page_rule(url: &str) -> Option<String> {
    excludable_url(url).map(|parsed| parsed.to_string())
}

/// Append `rule` unless an identical entry exists. Returns `true` if the list changed.
pub fn add_excluded_rule(rules: &mut Vec<String>, rule: &str) -> bool {
    let rule = rule.trim();
    if rule.is_empty() || rules.iter().any(|existing| existing == rule) {
        return false;
    }
    rules.push(rule.to_string());
    true
}

/// Trim entries, drop blanks and comments, and remove exact duplicates.
/// Returns `true` if the list changed.
pub fn normalize_excluded_rules(rules: &mut Vec<String>) -> bool {
    let mut normalized: Vec<String> = Vec::with_capacity(rules.len());
    for rule in rules.iter() {
        let trimmed = rule.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
            continue;
        }
        if normalized.iter().any(|existing| existing == trimmed) {
            continue;
        }
        normalized.push(trimmed.to_string());
    }
    let changed = normalized != *rules;
    *rules = normalized;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rule_kinds() {
        assert!(matches!(
            ExclusionRule::parse("Example.COM"),
            Some(ExclusionRule::Domain(d)) if d == "example.com"
        ));
        assert!(matches!(
            ExclusionRule::parse("*.example.com"),
            Some(ExclusionRule::Wildcard { .. })
        ));
        assert!(matches!(
            ExclusionRule::parse("https://example.com"),
            Some(ExclusionRule::Wildcard { .. })
        ));
        assert!(matches!(
            ExclusionRule::parse("re:^https://"),
            Some(ExclusionRule::Regex { matcher: Some(_), .. })
        ));
        assert!(ExclusionRule::parse("   ").is_none());
        assert!(ExclusionRule::parse("# docs").is_none());
    }

    #[test]
    fn domain_needs_label_boundary() {
        assert!(host_matches_domain("example.com", "example.com"));
        assert!(host_matches_domain("a.b.EXAMPLE.com", "example.com"));
        assert!(!host_matches_domain("notexample.com", "example.com"));
        assert!(!host_matches_domain("com", "example.com"));
    }

    #[test]
    fn wildcard_escapes_regex_syntax() {
        let rule = ExclusionRule::parse("https://example.com/a?b=(1)*").expect("rule");
        assert!(rule.matches("https://example.com/a?b=(1)&c", ""));
        assert!(!rule.matches("https://example.com/ab=(1)", ""));
    }

    #[test]
    fn broken_regex_never_matches() {
        let rule = ExclusionRule::parse("re:([").expect("rule");
        assert!(matches!(rule, ExclusionRule::Regex { matcher: None, .. }));
        assert!(!rule.matches("https://anything/", "anything"));
        assert_eq!(rule.source(), "re:([");
    }

    #[test]
    fn regex_is_case_insensitive() {
        let rule = ExclusionRule::parse("re:MAIL\\.").expect("rule");
        assert!(rule.matches("https://mail.example.com/", "mail.example.com"));
    }

    #[test]
    fn normalize_trims_and_dedupes() {
        let mut rules = vec![
            " example.com ".to_string(),
            "".to_string(),
            "# note".to_string(),
            "example.com".to_string(),
            "re:foo".to_string(),
        ];
        assert!(normalize_excluded_rules(&mut rules));
        assert_eq!(rules, vec!["example.com".to_string(), "re:foo".to_string()]);
        assert!(!normalize_excluded_rules(&mut rules));
    }
}
