//! Core type definitions for Corral
//!
//! These types describe routing rules and evaluation outcomes and are
//! shared by the matching engine and the rule-management layer.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

// =============================================================================
// Match Dialects
// =============================================================================

/// Pattern language a rule's pattern is interpreted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Full-URL string equality after normalization
    Exact,
    /// Hostname suffix match, optional path prefix
    Domain,
    /// `*`/`?` wildcards over the full URL
    Glob,
    /// Regular expression over the full URL
    Regex,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Domain => "domain",
            Self::Glob => "glob",
            Self::Regex => "regex",
        }
    }

    /// Parse from a wire/CSV name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Some(Self::Exact),
            "domain" => Some(Self::Domain),
            "glob" => Some(Self::Glob),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }
}

// =============================================================================
// Rule Classes
// =============================================================================

/// How a match is turned into a routing action, and its precedence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// URL prefers the rule's container; never overrides a manual choice
    Include,
    /// URL must stay out of every non-default container
    Exclude,
    /// URL may only be open in the rule's container
    Restrict,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Exclude => "exclude",
            Self::Restrict => "restrict",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "include" => Some(Self::Include),
            "exclude" => Some(Self::Exclude),
            "restrict" => Some(Self::Restrict),
            _ => None,
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Free-form rule annotations carried through persistence untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Provenance tag ("user", "csv-import", "preset:<slug>", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl RuleMetadata {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.source.is_none() && self.tags.is_empty()
    }
}

/// A routing directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub pattern: String,
    pub match_type: MatchType,
    pub rule_type: RuleType,
    /// Target container. Required for include/restrict, ignored on exclude.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub container_id: Option<String>,
    /// 1..=100, higher wins within a rule class.
    pub priority: u8,
    pub enabled: bool,
    /// Milliseconds since epoch.
    pub created: u64,
    pub modified: u64,
    #[serde(default, skip_serializing_if = "RuleMetadata::is_empty")]
    pub metadata: RuleMetadata,
}

pub const PRIORITY_MIN: u8 = 1;
pub const PRIORITY_MAX: u8 = 100;
pub const PRIORITY_DEFAULT: u8 = 50;

/// Ordering used to pick the winning rule inside one precedence bucket:
/// priority descending, then most recently modified, then lowest id.
pub fn decision_order(a: &Rule, b: &Rule) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.modified.cmp(&a.modified))
        .then_with(|| a.id.cmp(&b.id))
}

// =============================================================================
// Evaluation Results
// =============================================================================

/// Routing action decided for a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Leave the navigation in its current context
    Open,
    /// Move the navigation into `container_id`
    Redirect,
    /// Evict the navigation back to the default context
    Exclude,
    /// Hard-deny the navigation (policy layer only)
    Block,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Redirect => "redirect",
            Self::Exclude => "exclude",
            Self::Block => "block",
        }
    }
}

/// The engine's answer for one navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub action: Action,
    /// Present when `action` is `Redirect`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub container_id: Option<String>,
    /// The rule that produced the decision, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rule: Option<Rule>,
    /// Human-readable explanation; always present when no rule matched.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
}

impl EvaluationResult {
    pub fn open(rule: Option<Rule>) -> Self {
        Self {
            action: Action::Open,
            container_id: None,
            rule,
            reason: None,
        }
    }

    pub fn open_with_reason(reason: impl Into<String>) -> Self {
        Self {
            action: Action::Open,
            container_id: None,
            rule: None,
            reason: Some(reason.into()),
        }
    }

    pub fn redirect(container_id: impl Into<String>, rule: Rule) -> Self {
        Self {
            action: Action::Redirect,
            container_id: Some(container_id.into()),
            rule: Some(rule),
            reason: None,
        }
    }

    pub fn exclude(rule: Rule) -> Self {
        Self {
            action: Action::Exclude,
            container_id: None,
            rule: Some(rule),
            reason: None,
        }
    }
}
