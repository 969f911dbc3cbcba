//! Pattern matching across the four dialects
//!
//! This is the hot path: every navigation tests every enabled rule here.
//! Nothing in this module returns an error or panics; a malformed URL or
//! pattern is logged at debug level and reported as a non-match, so one
//! bad rule can never block navigation.

use regex::RegexBuilder;

use crate::types::MatchType;
use crate::url;

// =============================================================================
// Inline Dialect Overrides
// =============================================================================

/// Resolve the dialect a pattern is actually matched under.
///
/// A leading `@` forces regex and a leading `!` forces glob, regardless of
/// the rule's configured match type. The prefix is stripped before
/// matching. Domain rules never take overrides.
pub fn effective_dialect(pattern: &str, match_type: MatchType) -> (MatchType, &str) {
    if match_type == MatchType::Domain {
        return (MatchType::Domain, pattern);
    }
    if let Some(rest) = pattern.strip_prefix('@') {
        return (MatchType::Regex, rest);
    }
    if let Some(rest) = pattern.strip_prefix('!') {
        return (MatchType::Glob, rest);
    }
    (match_type, pattern)
}

// =============================================================================
// Matching
// =============================================================================

/// Test a URL against a single pattern under the given dialect.
pub fn matches(url: &str, pattern: &str, match_type: MatchType) -> bool {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return false;
    }

    let (dialect, pattern) = effective_dialect(pattern, match_type);

    match dialect {
        MatchType::Exact => match_exact(url, pattern),
        MatchType::Domain => match_domain(url, pattern),
        MatchType::Glob => match_glob(url, pattern),
        MatchType::Regex => match_regex(url, pattern),
    }
}

fn match_exact(url: &str, pattern: &str) -> bool {
    let left = match url::normalize(url) {
        Ok(u) => u,
        Err(e) => {
            log::debug!("exact match skipped, bad url {url:?}: {e}");
            return false;
        }
    };
    let right = match url::normalize(pattern) {
        Ok(p) => p,
        Err(e) => {
            log::debug!("exact match skipped, bad pattern {pattern:?}: {e}");
            return false;
        }
    };
    // normalization lowercases scheme and host, so a plain comparison is
    // host-insensitive and path-sensitive
    left == right
}

fn match_domain(url: &str, pattern: &str) -> bool {
    let parsed = match url::parse(url) {
        Ok(p) => p,
        Err(e) => {
            log::debug!("domain match skipped, bad url {url:?}: {e}");
            return false;
        }
    };
    let host = parsed.host.to_ascii_lowercase();

    // The pattern may carry a scheme and a path suffix: "d.tld/admin".
    let mut spec = pattern.trim();
    if let Some(idx) = spec.find("://") {
        spec = &spec[idx + 3..];
    }
    let (domain_part, path_prefix) = match spec.find('/') {
        Some(idx) => (&spec[..idx], Some(&spec[idx..])),
        None => (spec, None),
    };

    // "*.d.tld" covers the base domain itself as well as all subdomains;
    // a bare "d.tld" has the same closure.
    let base = domain_part
        .strip_prefix("*.")
        .unwrap_or(domain_part)
        .trim_matches('.')
        .to_ascii_lowercase();
    if base.is_empty() {
        return false;
    }

    let host_matches = host == base || host.ends_with(&format!(".{base}"));
    if !host_matches {
        return false;
    }

    match path_prefix {
        Some(prefix) => {
            let path = if parsed.path.is_empty() { "/" } else { parsed.path };
            path.starts_with(prefix)
        }
        None => true,
    }
}

fn match_glob(url: &str, pattern: &str) -> bool {
    let source = glob_to_regex(pattern);
    match RegexBuilder::new(&source).case_insensitive(true).build() {
        Ok(re) => re.is_match(url.trim()),
        Err(e) => {
            log::debug!("glob pattern {pattern:?} failed to compile: {e}");
            false
        }
    }
}

fn match_regex(url: &str, pattern: &str) -> bool {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => re.is_match(url.trim()),
        Err(e) => {
            log::debug!("regex pattern {pattern:?} failed to compile: {e}");
            false
        }
    }
}

// =============================================================================
// Glob Compilation
// =============================================================================

/// Compile a glob into an anchored regex source. `*` matches zero or more
/// of any character, `?` exactly one; everything else is literal.
pub fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c if "\\.+()[]{}|^$".contains(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}
