//! Corral rule management
//!
//! Everything that happens to a rule before the engine sees it: hard
//! validation at write time, the owning in-memory store, duplicate
//! detection, preset bundles, and CSV/JSON interchange. The evaluation
//! engine itself lives in `corral-core`; this crate never makes routing
//! decisions.

pub mod directory;
pub mod duplicates;
pub mod error;
pub mod interchange;
pub mod presets;
pub mod store;
pub mod validator;

pub use directory::{ContainerDirectory, ContainerInfo, StaticDirectory};
pub use duplicates::{
    duplicate_count, find_duplicate_rules, identity_key, suggest_rules_to_keep, DuplicateGroup,
    KeepSuggestion,
};
pub use error::RuleError;
pub use interchange::{export_csv, parse_csv, rules_from_json, rules_to_json, CsvImport};
pub use presets::{
    expand_preset, find_container_for_preset, find_preset, preset_rule_identity_keys, Preset,
    PRESETS,
};
pub use store::{NewRule, RulePatch, RuleSet, RuleSource};
pub use validator::{validate_rule, validate_rules, ValidationReport};
