//! Duplicate rule detection
//!
//! Two rules are duplicates when they agree on the identity key:
//! normalized pattern, match type, rule type and target container. The
//! detector groups a collection by that key and recommends which rule in
//! each group to keep.

use std::collections::HashMap;

use corral_core::types::{decision_order, Rule, RuleType};

/// Canonical identity key for duplicate detection. The key is derived,
/// never stored.
pub fn identity_key(rule: &Rule) -> String {
    identity_key_parts(
        &rule.pattern,
        rule.match_type.as_str(),
        rule.rule_type.as_str(),
        rule.container_id.as_deref(),
    )
}

/// Build an identity key from raw parts. Exclude rules never target a
/// container, so their container slot is always empty.
pub fn identity_key_parts(
    pattern: &str,
    match_type: &str,
    rule_type: &str,
    container_id: Option<&str>,
) -> String {
    let container = if rule_type == RuleType::Exclude.as_str() {
        ""
    } else {
        container_id.unwrap_or("")
    };
    format!(
        "{}|{}|{}|{}",
        pattern.trim().to_lowercase(),
        match_type,
        rule_type,
        container
    )
}

/// A set of rules sharing one identity key.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// Normalized pattern shared by the group.
    pub pattern: String,
    pub rules: Vec<Rule>,
}

/// Group a collection by identity key; only keys shared by two or more
/// rules are reported. Group order follows first appearance in the input.
pub fn find_duplicate_rules(rules: &[Rule]) -> Vec<DuplicateGroup> {
    let mut by_key: HashMap<String, Vec<Rule>> = HashMap::new();
    let mut key_order: Vec<String> = Vec::new();

    for rule in rules {
        let key = identity_key(rule);
        let entry = by_key.entry(key.clone()).or_default();
        if entry.is_empty() {
            key_order.push(key);
        }
        entry.push(rule.clone());
    }

    key_order
        .into_iter()
        .filter_map(|key| {
            let group = by_key.remove(&key)?;
            if group.len() < 2 {
                return None;
            }
            Some(DuplicateGroup {
                pattern: group[0].pattern.trim().to_lowercase(),
                rules: group,
            })
        })
        .collect()
}

/// Number of rules that could be removed without losing any identity:
/// the sum over groups of (group size - 1).
pub fn duplicate_count(rules: &[Rule]) -> usize {
    find_duplicate_rules(rules)
        .iter()
        .map(|g| g.rules.len() - 1)
        .sum()
}

/// Keep/remove recommendation for a set of duplicate groups.
#[derive(Debug, Clone, Default)]
pub struct KeepSuggestion {
    pub keep: Vec<Rule>,
    pub remove: Vec<Rule>,
}

/// Within each group keep the highest-priority rule (ties: most recently
/// modified, then lowest id); everything else goes to `remove`.
pub fn suggest_rules_to_keep(groups: &[DuplicateGroup]) -> KeepSuggestion {
    let mut suggestion = KeepSuggestion::default();

    for group in groups {
        let mut ranked: Vec<&Rule> = group.rules.iter().collect();
        ranked.sort_by(|a, b| decision_order(a, b));
        let mut iter = ranked.into_iter();
        if let Some(winner) = iter.next() {
            suggestion.keep.push(winner.clone());
        }
        suggestion.remove.extend(iter.cloned());
    }

    suggestion
}
