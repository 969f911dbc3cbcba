//! In-memory rule store
//!
//! Owns the rule collection, assigns ids and timestamps on write, and
//! hard-validates every mutation. The store keeps rules in insertion
//! order; the evaluator sorts its own snapshot, so no order discipline is
//! maintained here.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use corral_core::types::{Rule, RuleMetadata, RuleType, MatchType, PRIORITY_DEFAULT};

use crate::error::RuleError;
use crate::validator::validate_rule;

/// Milliseconds since epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Anything that can hand the interceptor a rule snapshot.
pub trait RuleSource {
    fn rules(&self) -> Result<Vec<Rule>, RuleError>;
}

/// Fields supplied when creating a rule; the store fills in the rest.
#[derive(Debug, Clone)]
pub struct NewRule {
    pub pattern: String,
    pub match_type: MatchType,
    pub rule_type: RuleType,
    pub container_id: Option<String>,
    pub priority: Option<u8>,
    pub enabled: Option<bool>,
    pub metadata: RuleMetadata,
}

/// Partial update applied to an existing rule.
#[derive(Debug, Clone, Default)]
pub struct RulePatch {
    pub pattern: Option<String>,
    pub match_type: Option<MatchType>,
    pub rule_type: Option<RuleType>,
    pub container_id: Option<Option<String>>,
    pub priority: Option<u8>,
    pub enabled: Option<bool>,
    pub metadata: Option<RuleMetadata>,
}

// =============================================================================
// Rule Set
// =============================================================================

/// Owned, mutable rule collection.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    next_seq: u32,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self {
            next_seq: rules.len() as u32,
            rules,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Create and store a rule. Assigns id and timestamps, applies
    /// defaults, and hard-validates before anything is stored.
    pub fn add_rule(&mut self, new: NewRule) -> Result<&Rule, RuleError> {
        let now = now_ms();
        let rule = Rule {
            id: self.generate_id(now),
            pattern: new.pattern,
            match_type: new.match_type,
            rule_type: new.rule_type,
            container_id: new.container_id,
            priority: new.priority.unwrap_or(PRIORITY_DEFAULT),
            enabled: new.enabled.unwrap_or(true),
            created: now,
            modified: now,
            metadata: new.metadata,
        };

        for warning in validate_rule(&rule)? {
            log::warn!("{warning}");
        }

        self.rules.push(rule);
        Ok(self.rules.last().expect("just pushed"))
    }

    /// Apply a patch to an existing rule, bumping `modified`.
    pub fn update_rule(&mut self, id: &str, patch: RulePatch) -> Result<&Rule, RuleError> {
        let idx = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RuleError::UnknownRule(id.to_string()))?;

        let mut updated = self.rules[idx].clone();
        if let Some(pattern) = patch.pattern {
            updated.pattern = pattern;
        }
        if let Some(match_type) = patch.match_type {
            updated.match_type = match_type;
        }
        if let Some(rule_type) = patch.rule_type {
            updated.rule_type = rule_type;
        }
        if let Some(container_id) = patch.container_id {
            updated.container_id = container_id;
        }
        if let Some(priority) = patch.priority {
            updated.priority = priority;
        }
        if let Some(enabled) = patch.enabled {
            updated.enabled = enabled;
        }
        if let Some(metadata) = patch.metadata {
            updated.metadata = metadata;
        }
        updated.modified = now_ms().max(updated.modified + 1);

        for warning in validate_rule(&updated)? {
            log::warn!("{warning}");
        }

        self.rules[idx] = updated;
        Ok(&self.rules[idx])
    }

    /// Remove a rule by id.
    pub fn remove_rule(&mut self, id: &str) -> Result<Rule, RuleError> {
        let idx = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RuleError::UnknownRule(id.to_string()))?;
        Ok(self.rules.remove(idx))
    }

    /// Insert an already-formed rule (imports). Rejects duplicate ids.
    pub fn insert_rule(&mut self, rule: Rule) -> Result<(), RuleError> {
        if self.get(&rule.id).is_some() {
            return Err(RuleError::DuplicateId(rule.id));
        }
        for warning in validate_rule(&rule)? {
            log::warn!("{warning}");
        }
        self.rules.push(rule);
        Ok(())
    }

    fn generate_id(&mut self, now: u64) -> String {
        loop {
            let id = format!("r{now:x}-{:04x}", self.next_seq);
            self.next_seq = self.next_seq.wrapping_add(1);
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    // =========================================================================
    // JSON persistence
    // =========================================================================

    pub fn load_json(path: &Path) -> Result<Self, RuleError> {
        let text = std::fs::read_to_string(path)?;
        let rules: Vec<Rule> = serde_json::from_str(&text)?;
        Ok(Self::from_rules(rules))
    }

    pub fn save_json(&self, path: &Path) -> Result<(), RuleError> {
        let text = serde_json::to_string_pretty(&self.rules)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

impl RuleSource for RuleSet {
    fn rules(&self) -> Result<Vec<Rule>, RuleError> {
        Ok(self.rules.clone())
    }
}
