//! Rule evaluation engine
//!
//! Pure and deterministic: the same rule snapshot, URL and context always
//! produce the same decision. The evaluator holds only a borrowed snapshot
//! and performs no I/O; callers re-create it per snapshot to observe rule
//! edits.

use crate::pattern;
use crate::types::{decision_order, Action, EvaluationResult, Rule, RuleType};

/// Message used when nothing matched.
pub const NO_MATCH_REASON: &str = "No matching rules found";

// =============================================================================
// Evaluator
// =============================================================================

/// The decision engine over one rule snapshot.
pub struct RuleEvaluator<'a> {
    rules: &'a [Rule],
}

impl<'a> RuleEvaluator<'a> {
    pub fn new(rules: &'a [Rule]) -> Self {
        Self { rules }
    }

    /// Decide what to do with a navigation to `url` currently running in
    /// `current` (None = the default, non-isolated context).
    ///
    /// Precedence is strict RESTRICT > EXCLUDE > INCLUDE; the first tier
    /// with a match decides and lower tiers are never consulted. Within a
    /// tier the winner is picked by [`decision_order`].
    pub fn evaluate(&self, url: &str, current: Option<&str>) -> EvaluationResult {
        let mut restrict: Vec<&Rule> = Vec::new();
        let mut exclude: Vec<&Rule> = Vec::new();
        let mut include: Vec<&Rule> = Vec::new();

        for rule in self.rules {
            if !rule.enabled {
                continue;
            }
            if !pattern::matches(url, &rule.pattern, rule.match_type) {
                continue;
            }
            match rule.rule_type {
                RuleType::Restrict => restrict.push(rule),
                RuleType::Exclude => exclude.push(rule),
                RuleType::Include => include.push(rule),
            }
        }

        if let Some(winner) = top(&mut restrict) {
            return decide_restrict(winner, current);
        }
        if let Some(winner) = top(&mut exclude) {
            return decide_exclude(winner, current);
        }
        if let Some(winner) = top(&mut include) {
            return decide_include(winner, current);
        }

        EvaluationResult::open_with_reason(NO_MATCH_REASON)
    }
}

fn top<'r>(bucket: &mut Vec<&'r Rule>) -> Option<&'r Rule> {
    bucket.sort_by(|a, b| decision_order(a, b));
    bucket.first().copied()
}

fn decide_restrict(rule: &Rule, current: Option<&str>) -> EvaluationResult {
    // Validation guarantees restrict rules carry a container, but a stale
    // snapshot must still degrade safely.
    let target = match rule.container_id.as_deref() {
        Some(t) => t,
        None => {
            log::warn!("restrict rule {} has no container, ignoring", rule.id);
            return EvaluationResult::open_with_reason(NO_MATCH_REASON);
        }
    };

    if current == Some(target) {
        EvaluationResult::open(Some(rule.clone()))
    } else {
        EvaluationResult::redirect(target, rule.clone())
    }
}

fn decide_exclude(rule: &Rule, current: Option<&str>) -> EvaluationResult {
    match current {
        None => EvaluationResult::open(Some(rule.clone())),
        Some(_) => EvaluationResult::exclude(rule.clone()),
    }
}

fn decide_include(rule: &Rule, current: Option<&str>) -> EvaluationResult {
    let target = match rule.container_id.as_deref() {
        Some(t) => t,
        None => {
            log::warn!("include rule {} has no container, ignoring", rule.id);
            return EvaluationResult::open_with_reason(NO_MATCH_REASON);
        }
    };

    match current {
        None => EvaluationResult::redirect(target, rule.clone()),
        Some(ctx) if ctx == target => EvaluationResult::open(Some(rule.clone())),
        // already isolated somewhere else by choice; do not override
        Some(_) => EvaluationResult {
            action: Action::Open,
            container_id: None,
            rule: Some(rule.clone()),
            reason: Some("Already in a container; include rule not applied".to_string()),
        },
    }
}

// =============================================================================
// Routing Policy
// =============================================================================

/// Post-evaluation gate over redirect targets.
///
/// The base evaluator only emits open/redirect/exclude. When a redirect
/// target is not permitted (deleted container, host policy), a restrict
/// redirect hardens into a block and an include redirect falls back to
/// open. This is the only producer of [`Action::Block`].
pub struct RoutingPolicy<F>
where
    F: Fn(&str) -> bool,
{
    is_permitted: F,
}

impl<F> RoutingPolicy<F>
where
    F: Fn(&str) -> bool,
{
    pub fn new(is_permitted: F) -> Self {
        Self { is_permitted }
    }

    pub fn apply(&self, result: EvaluationResult) -> EvaluationResult {
        if result.action != Action::Redirect {
            return result;
        }
        let target = match result.container_id.as_deref() {
            Some(t) => t,
            None => return result,
        };
        if (self.is_permitted)(target) {
            return result;
        }

        let restricted = result
            .rule
            .as_ref()
            .map(|r| r.rule_type == RuleType::Restrict)
            .unwrap_or(false);

        if restricted {
            EvaluationResult {
                action: Action::Block,
                container_id: None,
                rule: result.rule,
                reason: Some(format!("Restricted container '{target}' is not available")),
            }
        } else {
            EvaluationResult {
                action: Action::Open,
                container_id: None,
                rule: result.rule,
                reason: Some(format!("Container '{target}' is not available")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MatchType, Rule, RuleMetadata};

    fn rule(
        id: &str,
        pattern: &str,
        rule_type: RuleType,
        container: Option<&str>,
        priority: u8,
    ) -> Rule {
        Rule {
            id: id.to_string(),
            pattern: pattern.to_string(),
            match_type: MatchType::Domain,
            rule_type,
            container_id: container.map(str::to_string),
            priority,
            enabled: true,
            created: 0,
            modified: 0,
            metadata: RuleMetadata::default(),
        }
    }

    #[test]
    fn test_include_redirects_from_default() {
        let rules = vec![rule("r1", "github.com", RuleType::Include, Some("work"), 1)];
        let result = RuleEvaluator::new(&rules).evaluate("https://github.com/org/repo", None);
        assert_eq!(result.action, Action::Redirect);
        assert_eq!(result.container_id.as_deref(), Some("work"));
        assert_eq!(result.rule.as_ref().map(|r| r.id.as_str()), Some("r1"));
    }

    #[test]
    fn test_include_already_in_target_opens() {
        let rules = vec![rule("r1", "github.com", RuleType::Include, Some("work"), 1)];
        let result = RuleEvaluator::new(&rules).evaluate("https://github.com", Some("work"));
        assert_eq!(result.action, Action::Open);
    }

    #[test]
    fn test_include_never_overrides_other_container() {
        let rules = vec![rule("r1", "github.com", RuleType::Include, Some("work"), 99)];
        let result = RuleEvaluator::new(&rules).evaluate("https://github.com", Some("personal"));
        assert_eq!(result.action, Action::Open);
        assert!(result.reason.is_some());
    }

    #[test]
    fn test_exclude_beats_include_regardless_of_priority() {
        let rules = vec![
            rule("inc", "example.com", RuleType::Include, Some("work"), 1),
            rule("exc", "example.com", RuleType::Exclude, None, 5),
        ];
        let result = RuleEvaluator::new(&rules).evaluate("https://example.com", Some("work"));
        assert_eq!(result.action, Action::Exclude);
        assert_eq!(result.rule.as_ref().map(|r| r.id.as_str()), Some("exc"));
    }

    #[test]
    fn test_exclude_in_default_context_opens() {
        let rules = vec![rule("exc", "example.com", RuleType::Exclude, None, 50)];
        let result = RuleEvaluator::new(&rules).evaluate("https://example.com", None);
        assert_eq!(result.action, Action::Open);
    }

    #[test]
    fn test_restrict_redirects_out_of_wrong_container() {
        let rules = vec![rule("res", "example.com", RuleType::Restrict, Some("secure"), 10)];
        let eval = RuleEvaluator::new(&rules);

        let moved = eval.evaluate("https://example.com", Some("other"));
        assert_eq!(moved.action, Action::Redirect);
        assert_eq!(moved.container_id.as_deref(), Some("secure"));

        let stays = eval.evaluate("https://example.com", Some("secure"));
        assert_eq!(stays.action, Action::Open);
    }

    #[test]
    fn test_restrict_beats_exclude_and_include() {
        let rules = vec![
            rule("inc", "example.com", RuleType::Include, Some("work"), 100),
            rule("exc", "example.com", RuleType::Exclude, None, 100),
            rule("res", "example.com", RuleType::Restrict, Some("secure"), 1),
        ];
        let result = RuleEvaluator::new(&rules).evaluate("https://example.com", None);
        assert_eq!(result.action, Action::Redirect);
        assert_eq!(result.container_id.as_deref(), Some("secure"));
    }

    #[test]
    fn test_priority_within_bucket() {
        let rules = vec![
            rule("low", "example.com", RuleType::Include, Some("a"), 10),
            rule("high", "example.com", RuleType::Include, Some("b"), 90),
        ];
        let result = RuleEvaluator::new(&rules).evaluate("https://example.com", None);
        assert_eq!(result.container_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_priority_tie_breaks_on_modified_then_id() {
        let mut older = rule("a", "example.com", RuleType::Include, Some("old"), 50);
        older.modified = 100;
        let mut newer = rule("z", "example.com", RuleType::Include, Some("new"), 50);
        newer.modified = 200;
        let rules = vec![older, newer];
        let result = RuleEvaluator::new(&rules).evaluate("https://example.com", None);
        assert_eq!(result.container_id.as_deref(), Some("new"));
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let mut r = rule("r1", "example.com", RuleType::Include, Some("work"), 50);
        r.enabled = false;
        let rules = vec![r];
        let result = RuleEvaluator::new(&rules).evaluate("https://example.com", None);
        assert_eq!(result.action, Action::Open);
        assert_eq!(result.reason.as_deref(), Some(NO_MATCH_REASON));
    }

    #[test]
    fn test_malformed_url_degrades_to_no_match() {
        let rules = vec![rule("r1", "example.com", RuleType::Restrict, Some("secure"), 50)];
        let result = RuleEvaluator::new(&rules).evaluate("not a url", None);
        assert_eq!(result.action, Action::Open);
        assert_eq!(result.reason.as_deref(), Some(NO_MATCH_REASON));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let rules = vec![
            rule("inc", "example.com", RuleType::Include, Some("work"), 10),
            rule("exc", "mail.example.com", RuleType::Exclude, None, 20),
        ];
        let eval = RuleEvaluator::new(&rules);
        for url in ["https://example.com", "https://mail.example.com", "https://other.net"] {
            for ctx in [None, Some("work"), Some("personal")] {
                assert_eq!(eval.evaluate(url, ctx), eval.evaluate(url, ctx));
            }
        }
    }

    #[test]
    fn test_policy_blocks_unavailable_restrict_target() {
        let rules = vec![rule("res", "example.com", RuleType::Restrict, Some("gone"), 50)];
        let result = RuleEvaluator::new(&rules).evaluate("https://example.com", None);
        let policy = RoutingPolicy::new(|id: &str| id != "gone");
        let gated = policy.apply(result);
        assert_eq!(gated.action, Action::Block);
    }

    #[test]
    fn test_policy_opens_unavailable_include_target() {
        let rules = vec![rule("inc", "example.com", RuleType::Include, Some("gone"), 50)];
        let result = RuleEvaluator::new(&rules).evaluate("https://example.com", None);
        let policy = RoutingPolicy::new(|id: &str| id != "gone");
        let gated = policy.apply(result);
        assert_eq!(gated.action, Action::Open);
    }

    #[test]
    fn test_policy_passes_permitted_redirects() {
        let rules = vec![rule("inc", "example.com", RuleType::Include, Some("work"), 50)];
        let result = RuleEvaluator::new(&rules).evaluate("https://example.com", None);
        let policy = RoutingPolicy::new(|_: &str| true);
        let gated = policy.apply(result.clone());
        assert_eq!(gated, result);
    }
}
