//! Corral Core Library
//!
//! This crate provides the pure rule evaluation engine for the Corral
//! container router: given a URL, the caller's current isolation context
//! and a snapshot of routing rules, it decides whether the navigation is
//! left alone, redirected into another container, evicted back to the
//! default context, or blocked.
//!
//! The engine is synchronous and side-effect free. It owns no rule
//! storage; callers hand it a fresh snapshot per decision.
//!
//! # Modules
//!
//! - `url`: slice-based URL parsing and normalization
//! - `pattern`: the four match dialects (exact, domain, glob, regex)
//! - `evaluator`: bucket precedence and the routing decision
//! - `types`: shared type definitions

pub mod evaluator;
pub mod pattern;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use evaluator::{RoutingPolicy, RuleEvaluator, NO_MATCH_REASON};
pub use types::{Action, EvaluationResult, MatchType, Rule, RuleMetadata, RuleType};
pub use url::{extract_domain, is_valid, normalize, ParsedUrl, UrlError};
