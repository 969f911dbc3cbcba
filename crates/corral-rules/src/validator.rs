//! Structural and semantic rule validation
//!
//! Hard failures reject a rule before it reaches the store; warnings are
//! surfaced to the authoring side but leave the set usable. Regex
//! hardening (length cap, nested-quantifier check) hard-rejects uniformly
//! here, for both direct edits and CSV import.

use corral_core::pattern::effective_dialect;
use corral_core::types::{MatchType, Rule, RuleType, PRIORITY_MAX, PRIORITY_MIN};
use corral_core::url;
use regex::RegexBuilder;

use crate::error::RuleError;

/// Longest pattern accepted in any dialect.
pub const MAX_PATTERN_LEN: usize = 1024;

/// Outcome of validating a whole rule set.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

// =============================================================================
// Single-Rule Validation
// =============================================================================

/// Hard checks for one rule. Returns the rule's non-fatal warnings.
pub fn validate_rule(rule: &Rule) -> Result<Vec<String>, RuleError> {
    let pattern = rule.pattern.trim();
    if pattern.is_empty() {
        return Err(RuleError::Validation(vec![format!(
            "rule {}: pattern must not be empty",
            rule.id
        )]));
    }

    if pattern.len() > MAX_PATTERN_LEN {
        return Err(RuleError::UnsafePattern(format!(
            "rule {}: pattern exceeds {} characters",
            rule.id, MAX_PATTERN_LEN
        )));
    }

    if rule.priority < PRIORITY_MIN || rule.priority > PRIORITY_MAX {
        return Err(RuleError::Validation(vec![format!(
            "rule {}: priority {} outside {}..={}",
            rule.id, rule.priority, PRIORITY_MIN, PRIORITY_MAX
        )]));
    }

    let (dialect, stripped) = effective_dialect(pattern, rule.match_type);
    if dialect == MatchType::Regex {
        if has_nested_quantifier(stripped) {
            return Err(RuleError::UnsafePattern(format!(
                "rule {}: nested quantifiers risk catastrophic backtracking",
                rule.id
            )));
        }
        if let Err(e) = RegexBuilder::new(stripped).case_insensitive(true).build() {
            return Err(RuleError::InvalidRegex {
                rule: rule.id.clone(),
                message: e.to_string(),
            });
        }
    }

    match rule.rule_type {
        RuleType::Include | RuleType::Restrict => {
            if rule.container_id.as_deref().map_or(true, str::is_empty) {
                return Err(RuleError::MissingContainer(rule.id.clone()));
            }
        }
        RuleType::Exclude => {}
    }

    let mut warnings = Vec::new();
    if rule.rule_type == RuleType::Exclude && rule.container_id.is_some() {
        warnings.push(format!(
            "rule {}: exclude rules always target the default context; containerId is ignored",
            rule.id
        ));
    }
    Ok(warnings)
}

// =============================================================================
// Rule-Set Validation
// =============================================================================

/// Validate a whole rule set: every per-rule hard check, id uniqueness,
/// and structural conflicts between restrict rules.
pub fn validate_rules(rules: &[Rule]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut seen_ids = std::collections::HashSet::new();
    for rule in rules {
        if !seen_ids.insert(rule.id.as_str()) {
            errors.push(format!("duplicate rule id: {}", rule.id));
        }
        match validate_rule(rule) {
            Ok(rule_warnings) => warnings.extend(rule_warnings),
            Err(e) => errors.push(e.to_string()),
        }
    }

    // Restrict rules whose patterns overlap but disagree on the container
    // always resolve by priority/tie-break; the author should look at them.
    let restricts: Vec<&Rule> = rules
        .iter()
        .filter(|r| r.rule_type == RuleType::Restrict)
        .collect();
    for (i, a) in restricts.iter().enumerate() {
        for b in &restricts[i + 1..] {
            if a.container_id != b.container_id && patterns_overlap(a, b) {
                warnings.push(format!(
                    "restrict rules {} and {} overlap but target different containers",
                    a.id, b.id
                ));
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Conservative static overlap test between two rule patterns.
fn patterns_overlap(a: &Rule, b: &Rule) -> bool {
    if a.match_type == MatchType::Domain && b.match_type == MatchType::Domain {
        let da = domain_base(&a.pattern);
        let db = domain_base(&b.pattern);
        if da.is_empty() || db.is_empty() {
            return false;
        }
        return da == db
            || da.ends_with(&format!(".{db}"))
            || db.ends_with(&format!(".{da}"));
    }
    a.match_type == b.match_type
        && a.pattern.trim().to_lowercase() == b.pattern.trim().to_lowercase()
}

fn domain_base(pattern: &str) -> String {
    let spec = pattern.trim();
    let spec = match spec.find("://") {
        Some(idx) => &spec[idx + 3..],
        None => spec,
    };
    let spec = spec.split('/').next().unwrap_or("");
    url::extract_domain(spec.strip_prefix("*.").unwrap_or(spec)).unwrap_or_default()
}

// =============================================================================
// Regex Hardening
// =============================================================================

/// Detect `(X+)+`-shaped patterns: a quantified group whose body is itself
/// quantified. This is a heuristic, not a proof; it catches the classic
/// catastrophic-backtracking shapes.
pub fn has_nested_quantifier(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    // quantifier seen at each open-group depth since the group opened
    let mut quantified_inside = vec![false];
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 1; // skip escaped char
            }
            b'(' => quantified_inside.push(false),
            b')' => {
                let inner = quantified_inside.pop().unwrap_or(false);
                let next = bytes.get(i + 1);
                let group_quantified =
                    matches!(next, Some(b'+') | Some(b'*')) || matches!(next, Some(b'{'));
                if inner && group_quantified {
                    return true;
                }
                // a quantified group counts as a quantifier for the parent
                if group_quantified {
                    if let Some(last) = quantified_inside.last_mut() {
                        *last = true;
                    }
                }
            }
            b'+' | b'*' => {
                if let Some(last) = quantified_inside.last_mut() {
                    *last = true;
                }
            }
            b'{' => {
                // treat bounded repetition with an open upper bound as a quantifier
                if let Some(close) = pattern[i..].find('}') {
                    let body = &pattern[i + 1..i + close];
                    if body.contains(',') {
                        if let Some(last) = quantified_inside.last_mut() {
                            *last = true;
                        }
                    }
                    i += close;
                }
            }
            _ => {}
        }
        i += 1;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::types::{RuleMetadata, PRIORITY_DEFAULT};

    fn rule(id: &str, pattern: &str, match_type: MatchType, rule_type: RuleType) -> Rule {
        Rule {
            id: id.to_string(),
            pattern: pattern.to_string(),
            match_type,
            rule_type,
            container_id: match rule_type {
                RuleType::Exclude => None,
                _ => Some("work".to_string()),
            },
            priority: PRIORITY_DEFAULT,
            enabled: true,
            created: 0,
            modified: 0,
            metadata: RuleMetadata::default(),
        }
    }

    #[test]
    fn test_valid_rule_passes() {
        let r = rule("r1", "github.com", MatchType::Domain, RuleType::Include);
        assert!(validate_rule(&r).unwrap().is_empty());
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let r = rule("r1", "   ", MatchType::Domain, RuleType::Include);
        assert!(matches!(validate_rule(&r), Err(RuleError::Validation(_))));
    }

    #[test]
    fn test_bad_regex_rejected() {
        let r = rule("r1", "(unclosed", MatchType::Regex, RuleType::Include);
        assert!(matches!(validate_rule(&r), Err(RuleError::InvalidRegex { .. })));
    }

    #[test]
    fn test_regex_override_is_checked_too() {
        // glob-typed rule with '@' prefix is effectively regex
        let r = rule("r1", "@(unclosed", MatchType::Glob, RuleType::Include);
        assert!(matches!(validate_rule(&r), Err(RuleError::InvalidRegex { .. })));
    }

    #[test]
    fn test_missing_container_rejected() {
        let mut r = rule("r1", "github.com", MatchType::Domain, RuleType::Restrict);
        r.container_id = None;
        assert!(matches!(validate_rule(&r), Err(RuleError::MissingContainer(_))));

        let mut r2 = rule("r2", "github.com", MatchType::Domain, RuleType::Include);
        r2.container_id = Some(String::new());
        assert!(matches!(validate_rule(&r2), Err(RuleError::MissingContainer(_))));
    }

    #[test]
    fn test_priority_bounds() {
        let mut r = rule("r1", "github.com", MatchType::Domain, RuleType::Include);
        r.priority = 0;
        assert!(validate_rule(&r).is_err());
        r.priority = 100;
        assert!(validate_rule(&r).is_ok());
    }

    #[test]
    fn test_exclude_with_container_warns() {
        let mut r = rule("r1", "github.com", MatchType::Domain, RuleType::Exclude);
        r.container_id = Some("work".to_string());
        let warnings = validate_rule(&r).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_unsafe_regex_rejected() {
        let r = rule("r1", "(a+)+$", MatchType::Regex, RuleType::Include);
        assert!(matches!(validate_rule(&r), Err(RuleError::UnsafePattern(_))));

        let long = "a".repeat(MAX_PATTERN_LEN + 1);
        let r2 = rule("r2", &long, MatchType::Glob, RuleType::Include);
        assert!(matches!(validate_rule(&r2), Err(RuleError::UnsafePattern(_))));
    }

    #[test]
    fn test_nested_quantifier_heuristic() {
        assert!(has_nested_quantifier("(a+)+"));
        assert!(has_nested_quantifier("(x*)*"));
        assert!(has_nested_quantifier("((ab)+c+)*"));
        assert!(has_nested_quantifier("(a{1,})+"));
        assert!(!has_nested_quantifier("a+b+c+"));
        assert!(!has_nested_quantifier("(abc)+"));
        assert!(!has_nested_quantifier(r"\(a+\)+"));
        assert!(!has_nested_quantifier("(a+)(b+)"));
    }

    #[test]
    fn test_duplicate_ids_fail_set() {
        let rules = vec![
            rule("same", "a.com", MatchType::Domain, RuleType::Include),
            rule("same", "b.com", MatchType::Domain, RuleType::Include),
        ];
        let report = validate_rules(&rules);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("duplicate rule id")));
    }

    #[test]
    fn test_restrict_conflict_warns() {
        let mut a = rule("a", "example.com", MatchType::Domain, RuleType::Restrict);
        a.container_id = Some("one".to_string());
        let mut b = rule("b", "www.example.com", MatchType::Domain, RuleType::Restrict);
        b.container_id = Some("two".to_string());
        let report = validate_rules(&[a, b]);
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_restrict_same_container_no_warning() {
        let a = rule("a", "example.com", MatchType::Domain, RuleType::Restrict);
        let b = rule("b", "example.com", MatchType::Domain, RuleType::Restrict);
        let report = validate_rules(&[a, b]);
        assert!(report.warnings.is_empty());
    }
}
