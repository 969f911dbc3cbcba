//! Error types for the rule-management layer
//!
//! All of these are raised synchronously at write time. The evaluator has
//! no error channel at all; a rule that would error here is rejected
//! before it can affect routing.

use thiserror::Error;

/// Error type for rule creation, mutation and interchange.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule set rejected: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("duplicate rule id: {0}")]
    DuplicateId(String),
    #[error("rule {0} requires a container")]
    MissingContainer(String),
    #[error("invalid regex in rule {rule}: {message}")]
    InvalidRegex { rule: String, message: String },
    #[error("pattern rejected as unsafe: {0}")]
    UnsafePattern(String),
    #[error("no rule with id {0}")]
    UnknownRule(String),
    #[error("csv line {line}: {message}")]
    Csv { line: usize, message: String },
    #[error("rule file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("rule file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
