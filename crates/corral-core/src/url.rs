//! URL parsing utilities for the evaluation hot path
//!
//! These functions work directly on string slices and avoid allocating
//! until a normalized form is actually requested.

use thiserror::Error;

/// Error type for URL decomposition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,
    #[error("missing or malformed scheme")]
    MissingScheme,
    #[error("empty host")]
    EmptyHost,
    #[error("invalid port: {0}")]
    InvalidPort(String),
}

/// Schemes a navigation can actually be routed under.
const NAVIGABLE_SCHEMES: &[&str] = &["http", "https", "ftp"];

// =============================================================================
// Decomposition
// =============================================================================

/// A URL decomposed into borrowed components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl<'a> {
    pub scheme: &'a str,
    pub host: &'a str,
    pub port: Option<u16>,
    /// Path including the leading '/', or "" when absent.
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl ParsedUrl<'_> {
    /// The port implied by the scheme when none is spelled out.
    pub fn default_port(&self) -> Option<u16> {
        default_port(self.scheme)
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        "ftp" => Some(21),
        _ => None,
    }
}

/// Decompose a URL into scheme, host, port, path, query and fragment.
pub fn parse(url: &str) -> Result<ParsedUrl<'_>, UrlError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(UrlError::Empty);
    }

    let scheme_end = url.find("://").ok_or(UrlError::MissingScheme)?;
    let scheme = &url[..scheme_end];
    if scheme.is_empty() || !scheme.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-') {
        return Err(UrlError::MissingScheme);
    }

    let rest = &url[scheme_end + 3..];

    // Authority ends at the first of '/', '?', '#'.
    let authority_end = rest
        .find(|c| c == '/' || c == '?' || c == '#')
        .unwrap_or(rest.len());
    let mut authority = &rest[..authority_end];

    // Skip userinfo if present.
    if let Some(at) = authority.rfind('@') {
        authority = &authority[at + 1..];
    }

    let (host, port) = match authority.rfind(':') {
        Some(colon) if !authority[colon + 1..].is_empty() => {
            let port_str = &authority[colon + 1..];
            let port = port_str
                .parse::<u16>()
                .map_err(|_| UrlError::InvalidPort(port_str.to_string()))?;
            (&authority[..colon], Some(port))
        }
        Some(colon) => (&authority[..colon], None),
        None => (authority, None),
    };

    if host.is_empty() {
        return Err(UrlError::EmptyHost);
    }

    let tail = &rest[authority_end..];
    let (path, tail) = match tail.find(|c| c == '?' || c == '#') {
        Some(idx) => (&tail[..idx], &tail[idx..]),
        None => (tail, ""),
    };

    let (query, fragment) = if let Some(stripped) = tail.strip_prefix('?') {
        match stripped.find('#') {
            Some(idx) => (Some(&stripped[..idx]), Some(&stripped[idx + 1..])),
            None => (Some(stripped), None),
        }
    } else if let Some(stripped) = tail.strip_prefix('#') {
        (None, Some(stripped))
    } else {
        (None, None)
    };

    Ok(ParsedUrl {
        scheme,
        host,
        port,
        path,
        query,
        fragment,
    })
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalize a URL for comparison: lowercase scheme and host, strip the
/// scheme's default port, and drop a bare trailing '/' path. Deeper paths
/// are left untouched (case-sensitive).
pub fn normalize(url: &str) -> Result<String, UrlError> {
    let parsed = parse(url)?;

    let scheme = parsed.scheme.to_ascii_lowercase();
    let host = parsed.host.to_ascii_lowercase();

    let mut out = String::with_capacity(url.len());
    out.push_str(&scheme);
    out.push_str("://");
    out.push_str(&host);

    if let Some(port) = parsed.port {
        if Some(port) != default_port(&scheme) {
            out.push(':');
            out.push_str(&port.to_string());
        }
    }

    if parsed.path != "/" && !parsed.path.is_empty() {
        out.push_str(parsed.path);
    }

    if let Some(query) = parsed.query {
        out.push('?');
        out.push_str(query);
    }

    if let Some(fragment) = parsed.fragment {
        out.push('#');
        out.push_str(fragment);
    }

    Ok(out)
}

// =============================================================================
// Host Helpers
// =============================================================================

/// Return the lowercased hostname whether given a full URL or a bare host.
pub fn extract_domain(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.contains("://") {
        return parse(input).ok().map(|p| p.host.to_ascii_lowercase());
    }

    // Bare host, possibly with a path suffix.
    let host_end = input
        .find(|c| c == '/' || c == '?' || c == '#' || c == ':')
        .unwrap_or(input.len());
    let host = input[..host_end].trim_matches('.');
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// Get the parent domain (strip leftmost label).
pub fn parent_domain(host: &str) -> Option<&str> {
    match host.find('.') {
        Some(idx) if idx < host.len() - 1 => Some(&host[idx + 1..]),
        _ => None,
    }
}

/// True iff the URL parses and carries a navigable scheme.
pub fn is_valid(url: &str) -> bool {
    match parse(url) {
        Ok(parsed) => NAVIGABLE_SCHEMES
            .iter()
            .any(|s| parsed.scheme.eq_ignore_ascii_case(s)),
        Err(_) => false,
    }
}
