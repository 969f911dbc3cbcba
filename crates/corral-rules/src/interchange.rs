//! Plain-text rule interchange
//!
//! CSV rows are the lowest-common-denominator format:
//!
//! ```text
//! pattern,container_name,match_type,rule_type,priority,enabled,description
//! ```
//!
//! `#`-prefixed lines are comments. Only `pattern` and `container_name`
//! are mandatory; omitted trailing fields take defaults. JSON interchange
//! is the serde shape of [`Rule`] unchanged.

use corral_core::types::{
    MatchType, Rule, RuleMetadata, RuleType, PRIORITY_DEFAULT,
};

use crate::directory::ContainerDirectory;
use crate::error::RuleError;
use crate::store::NewRule;

// =============================================================================
// CSV Import
// =============================================================================

/// Outcome of parsing a CSV document: rules that parsed cleanly plus
/// per-line failures. A bad line never aborts the rest of the import.
#[derive(Debug, Default)]
pub struct CsvImport {
    pub rules: Vec<NewRule>,
    pub errors: Vec<RuleError>,
}

/// Parse CSV rows into creation requests, resolving container names
/// through the directory.
pub fn parse_csv<D: ContainerDirectory>(text: &str, directory: &D) -> CsvImport {
    let mut import = CsvImport::default();

    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_csv_row(line, directory) {
            Ok(rule) => import.rules.push(rule),
            Err(message) => {
                log::warn!("csv line {}: {}", line_no + 1, message);
                import.errors.push(RuleError::Csv {
                    line: line_no + 1,
                    message,
                });
            }
        }
    }

    import
}

fn parse_csv_row<D: ContainerDirectory>(line: &str, directory: &D) -> Result<NewRule, String> {
    let mut fields = line.splitn(7, ',').map(str::trim);

    let pattern = fields.next().unwrap_or("");
    if pattern.is_empty() {
        return Err("pattern is required".to_string());
    }

    let container_name = fields.next().unwrap_or("");
    let match_type_field = fields.next().unwrap_or("");
    let rule_type_field = fields.next().unwrap_or("");
    let priority_field = fields.next().unwrap_or("");
    let enabled_field = fields.next().unwrap_or("");
    let description = fields.next().unwrap_or("");

    let rule_type = if rule_type_field.is_empty() {
        RuleType::Include
    } else {
        RuleType::parse(rule_type_field)
            .ok_or_else(|| format!("unknown rule_type {rule_type_field:?}"))?
    };

    let match_type = if match_type_field.is_empty() {
        // an inline override prefix on a defaulted row promotes the match
        // type, so the domain default does not swallow the override
        if pattern.starts_with('@') {
            MatchType::Regex
        } else if pattern.starts_with('!') {
            MatchType::Glob
        } else {
            MatchType::Domain
        }
    } else {
        MatchType::parse(match_type_field)
            .ok_or_else(|| format!("unknown match_type {match_type_field:?}"))?
    };

    let container_id = if container_name.is_empty() {
        if rule_type != RuleType::Exclude {
            return Err("container_name is required for include/restrict rows".to_string());
        }
        None
    } else {
        Some(
            directory
                .by_name(container_name)
                .ok_or_else(|| format!("unknown container {container_name:?}"))?
                .id,
        )
    };

    let priority = if priority_field.is_empty() {
        PRIORITY_DEFAULT
    } else {
        priority_field
            .parse::<u8>()
            .map_err(|_| format!("invalid priority {priority_field:?}"))?
    };

    let enabled = if enabled_field.is_empty() {
        true
    } else {
        match enabled_field.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => return Err(format!("invalid enabled flag {other:?}")),
        }
    };

    Ok(NewRule {
        pattern: pattern.to_string(),
        match_type,
        rule_type,
        container_id,
        priority: Some(priority),
        enabled: Some(enabled),
        metadata: RuleMetadata {
            description: if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            },
            source: Some("csv-import".to_string()),
            tags: Vec::new(),
        },
    })
}

// =============================================================================
// CSV Export
// =============================================================================

/// Render rules as CSV rows, resolving container ids back to names.
/// Patterns containing a comma cannot survive the row format and are
/// skipped with a warning.
pub fn export_csv<D: ContainerDirectory>(rules: &[Rule], directory: &D) -> String {
    let mut out = String::new();
    out.push_str("# pattern,container_name,match_type,rule_type,priority,enabled,description\n");

    for rule in rules {
        if rule.pattern.contains(',') {
            log::warn!("rule {} pattern contains a comma, skipped in csv export", rule.id);
            continue;
        }

        let container_name = rule
            .container_id
            .as_deref()
            .map(|id| {
                directory
                    .by_id(id)
                    .map(|c| c.name)
                    .unwrap_or_else(|| id.to_string())
            })
            .unwrap_or_default();

        let description = rule
            .metadata
            .description
            .as_deref()
            .unwrap_or("")
            .replace(',', ";");

        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            rule.pattern,
            container_name,
            rule.match_type.as_str(),
            rule.rule_type.as_str(),
            rule.priority,
            rule.enabled,
            description
        ));
    }

    out
}

// =============================================================================
// JSON
// =============================================================================

pub fn rules_to_json(rules: &[Rule]) -> Result<String, RuleError> {
    Ok(serde_json::to_string_pretty(rules)?)
}

pub fn rules_from_json(text: &str) -> Result<Vec<Rule>, RuleError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use crate::store::RuleSet;

    fn directory() -> StaticDirectory {
        let mut dir = StaticDirectory::default();
        dir.add("c-work", "Work");
        dir.add("c-personal", "Personal");
        dir
    }

    #[test]
    fn test_parse_minimal_row() {
        let import = parse_csv("github.com,Work", &directory());
        assert!(import.errors.is_empty());
        assert_eq!(import.rules.len(), 1);
        let rule = &import.rules[0];
        assert_eq!(rule.pattern, "github.com");
        assert_eq!(rule.match_type, MatchType::Domain);
        assert_eq!(rule.rule_type, RuleType::Include);
        assert_eq!(rule.container_id.as_deref(), Some("c-work"));
        assert_eq!(rule.priority, Some(PRIORITY_DEFAULT));
        assert_eq!(rule.enabled, Some(true));
    }

    #[test]
    fn test_parse_full_row() {
        let import = parse_csv(
            "example.com,Personal,exact,restrict,90,false,locked down",
            &directory(),
        );
        let rule = &import.rules[0];
        assert_eq!(rule.match_type, MatchType::Exact);
        assert_eq!(rule.rule_type, RuleType::Restrict);
        assert_eq!(rule.priority, Some(90));
        assert_eq!(rule.enabled, Some(false));
        assert_eq!(rule.metadata.description.as_deref(), Some("locked down"));
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "# header\n\n  \ngithub.com,Work\n# trailing";
        let import = parse_csv(text, &directory());
        assert_eq!(import.rules.len(), 1);
        assert!(import.errors.is_empty());
    }

    #[test]
    fn test_exclude_row_without_container() {
        let import = parse_csv("bank.example.com,,,exclude", &directory());
        assert!(import.errors.is_empty());
        let rule = &import.rules[0];
        assert_eq!(rule.rule_type, RuleType::Exclude);
        assert!(rule.container_id.is_none());
    }

    #[test]
    fn test_include_row_without_container_fails() {
        let import = parse_csv("github.com,", &directory());
        assert!(import.rules.is_empty());
        assert_eq!(import.errors.len(), 1);
    }

    #[test]
    fn test_unknown_container_fails_line_only() {
        let text = "github.com,Nowhere\ngitlab.com,Work";
        let import = parse_csv(text, &directory());
        assert_eq!(import.rules.len(), 1);
        assert_eq!(import.errors.len(), 1);
        assert!(matches!(import.errors[0], RuleError::Csv { line: 1, .. }));
    }

    #[test]
    fn test_override_prefix_promotes_match_type() {
        let import = parse_csv(
            "@^https://.*\\.example\\.com/$,Work\n!*://example.com/*,Work",
            &directory(),
        );
        assert!(import.errors.is_empty());
        assert_eq!(import.rules[0].match_type, MatchType::Regex);
        assert_eq!(import.rules[1].match_type, MatchType::Glob);
        // the prefix stays in the pattern for the matcher to honor
        assert!(import.rules[0].pattern.starts_with('@'));
    }

    #[test]
    fn test_explicit_match_type_wins_over_prefix() {
        let import = parse_csv("!*://example.com/*,Work,glob", &directory());
        assert_eq!(import.rules[0].match_type, MatchType::Glob);
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = directory();
        let text = "\
github.com,Work,domain,include,70,true,dev work
example.com,Personal,exact,restrict,90,false,
tracker.example.net,,glob,exclude,10,true,no container
";
        let import = parse_csv(text, &dir);
        assert!(import.errors.is_empty());

        let mut set = RuleSet::new();
        for new in import.rules {
            set.add_rule(new).unwrap();
        }

        let exported = export_csv(set.rules(), &dir);
        let reimported = parse_csv(&exported, &dir);
        assert!(reimported.errors.is_empty());
        assert_eq!(reimported.rules.len(), set.len());

        for (new, old) in reimported.rules.iter().zip(set.rules()) {
            assert_eq!(new.pattern, old.pattern);
            assert_eq!(new.container_id, old.container_id);
            assert_eq!(new.match_type, old.match_type);
            assert_eq!(new.rule_type, old.rule_type);
            assert_eq!(new.priority, Some(old.priority));
            assert_eq!(new.enabled, Some(old.enabled));
        }
    }

    #[test]
    fn test_json_round_trip() {
        let mut set = RuleSet::new();
        set.add_rule(NewRule {
            pattern: "github.com".to_string(),
            match_type: MatchType::Domain,
            rule_type: RuleType::Include,
            container_id: Some("c-work".to_string()),
            priority: Some(70),
            enabled: Some(true),
            metadata: RuleMetadata::default(),
        })
        .unwrap();

        let json = rules_to_json(set.rules()).unwrap();
        let back = rules_from_json(&json).unwrap();
        assert_eq!(back, set.rules());
    }
}
