//! Corral CLI
//!
//! Tooling around the routing engine: evaluate a URL against a rule file,
//! validate rule files, CSV import/export, duplicate reports and preset
//! bundles. Rule files are JSON arrays in the persisted rule shape;
//! container directories are JSON arrays of `{id, name, marker?}`.

use std::fs;
use std::path::Path;

use clap::{Parser, Subcommand};
use serde::Deserialize;

use corral_core::{RoutingPolicy, RuleEvaluator};
use corral_rules::{
    duplicate_count, expand_preset, export_csv, find_container_for_preset, find_duplicate_rules,
    find_preset, identity_key, parse_csv, preset_rule_identity_keys, suggest_rules_to_keep,
    validate_rules, ContainerDirectory, RuleSet, StaticDirectory, PRESETS,
};

#[derive(Parser)]
#[command(name = "corral")]
#[command(about = "Container routing rule engine and tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide how a navigation would be routed
    Evaluate {
        /// Rule file (JSON)
        #[arg(short, long)]
        rules: String,

        /// URL to evaluate
        url: String,

        /// Current container id (omit for the default context)
        #[arg(short, long)]
        container: Option<String>,

        /// Container directory (JSON); when given, redirects into unknown
        /// containers are gated
        #[arg(long)]
        containers: Option<String>,
    },

    /// Validate a rule file
    Validate {
        /// Rule file (JSON)
        #[arg(short, long)]
        rules: String,
    },

    /// Import CSV rows into a rule file
    Import {
        /// Input CSV file
        #[arg(short, long)]
        input: String,

        /// Container directory (JSON)
        #[arg(short, long)]
        containers: String,

        /// Rule file to create or extend
        #[arg(short, long)]
        rules: String,
    },

    /// Export a rule file as CSV
    Export {
        /// Rule file (JSON)
        #[arg(short, long)]
        rules: String,

        /// Container directory (JSON)
        #[arg(short, long)]
        containers: String,

        /// Output CSV file
        #[arg(short, long)]
        output: String,
    },

    /// Report duplicate rules and what could be removed
    Duplicates {
        /// Rule file (JSON)
        #[arg(short, long)]
        rules: String,

        /// Remove the redundant rules and rewrite the file
        #[arg(long)]
        prune: bool,
    },

    /// List preset bundles or apply one to a rule file
    Presets {
        /// Preset slug to apply; lists the catalog when omitted
        slug: Option<String>,

        /// Container directory (JSON); required when applying
        #[arg(short, long)]
        containers: Option<String>,

        /// Rule file to extend; required when applying
        #[arg(short, long)]
        rules: Option<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            rules,
            url,
            container,
            containers,
        } => cmd_evaluate(&rules, &url, container.as_deref(), containers.as_deref()),
        Commands::Validate { rules } => cmd_validate(&rules),
        Commands::Import {
            input,
            containers,
            rules,
        } => cmd_import(&input, &containers, &rules),
        Commands::Export {
            rules,
            containers,
            output,
        } => cmd_export(&rules, &containers, &output),
        Commands::Duplicates { rules, prune } => cmd_duplicates(&rules, prune),
        Commands::Presets {
            slug,
            containers,
            rules,
        } => cmd_presets(slug.as_deref(), containers.as_deref(), rules.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

// =============================================================================
// File loading
// =============================================================================

#[derive(Deserialize)]
struct ContainerRecord {
    id: String,
    name: String,
    #[serde(default)]
    marker: Option<String>,
}

fn load_rules(path: &str) -> Result<RuleSet, String> {
    RuleSet::load_json(Path::new(path)).map_err(|e| format!("failed to load '{path}': {e}"))
}

fn load_directory(path: &str) -> Result<StaticDirectory, String> {
    let text =
        fs::read_to_string(path).map_err(|e| format!("failed to read '{path}': {e}"))?;
    let records: Vec<ContainerRecord> =
        serde_json::from_str(&text).map_err(|e| format!("invalid container file '{path}': {e}"))?;

    let mut dir = StaticDirectory::default();
    for record in records {
        match record.marker {
            Some(marker) => dir.add_with_marker(record.id, record.name, marker),
            None => dir.add(record.id, record.name),
        }
    }
    Ok(dir)
}

// =============================================================================
// Commands
// =============================================================================

fn cmd_evaluate(
    rules_path: &str,
    url: &str,
    container: Option<&str>,
    containers_path: Option<&str>,
) -> Result<(), String> {
    let set = load_rules(rules_path)?;
    let evaluator = RuleEvaluator::new(set.rules());
    let mut result = evaluator.evaluate(url, container);

    if let Some(path) = containers_path {
        let dir = load_directory(path)?;
        let policy = RoutingPolicy::new(|id: &str| dir.by_id(id).is_some());
        result = policy.apply(result);
    }

    let json = serde_json::to_string_pretty(&result)
        .map_err(|e| format!("failed to render result: {e}"))?;
    println!("{json}");
    Ok(())
}

fn cmd_validate(rules_path: &str) -> Result<(), String> {
    let set = load_rules(rules_path)?;
    let report = validate_rules(set.rules());

    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    for error in &report.errors {
        println!("error: {error}");
    }

    if report.valid {
        println!(
            "'{}' is valid ({} rules, {} warnings)",
            rules_path,
            set.len(),
            report.warnings.len()
        );
        Ok(())
    } else {
        Err(format!("'{}' failed validation with {} errors", rules_path, report.errors.len()))
    }
}

fn cmd_import(input: &str, containers_path: &str, rules_path: &str) -> Result<(), String> {
    let dir = load_directory(containers_path)?;
    let text = fs::read_to_string(input).map_err(|e| format!("failed to read '{input}': {e}"))?;

    let import = parse_csv(&text, &dir);
    for error in &import.errors {
        println!("skipped: {error}");
    }

    let mut set = if Path::new(rules_path).exists() {
        load_rules(rules_path)?
    } else {
        RuleSet::new()
    };

    let before = set.len();
    let mut rejected = 0usize;
    for new in import.rules {
        if let Err(e) = set.add_rule(new) {
            println!("rejected: {e}");
            rejected += 1;
        }
    }

    set.save_json(Path::new(rules_path))
        .map_err(|e| format!("failed to write '{rules_path}': {e}"))?;

    println!(
        "Imported {} rules into '{}' ({} csv errors, {} rejected)",
        set.len() - before,
        rules_path,
        import.errors.len(),
        rejected
    );
    Ok(())
}

fn cmd_export(rules_path: &str, containers_path: &str, output: &str) -> Result<(), String> {
    let set = load_rules(rules_path)?;
    let dir = load_directory(containers_path)?;

    let csv = export_csv(set.rules(), &dir);
    fs::write(output, &csv).map_err(|e| format!("failed to write '{output}': {e}"))?;

    println!("Exported {} rules to '{}'", set.len(), output);
    Ok(())
}

fn cmd_duplicates(rules_path: &str, prune: bool) -> Result<(), String> {
    let mut set = load_rules(rules_path)?;
    let groups = find_duplicate_rules(set.rules());

    if groups.is_empty() {
        println!("No duplicate rules in '{rules_path}'");
        return Ok(());
    }

    println!(
        "{} duplicate groups, {} rules removable",
        groups.len(),
        duplicate_count(set.rules())
    );
    for group in &groups {
        println!("  {} ({} rules)", group.pattern, group.rules.len());
    }

    if !prune {
        return Ok(());
    }

    let suggestion = suggest_rules_to_keep(&groups);
    for rule in &suggestion.remove {
        set.remove_rule(&rule.id)
            .map_err(|e| format!("failed to prune rule {}: {e}", rule.id))?;
    }
    set.save_json(Path::new(rules_path))
        .map_err(|e| format!("failed to write '{rules_path}': {e}"))?;

    println!("Removed {} rules, kept {}", suggestion.remove.len(), suggestion.keep.len());
    Ok(())
}

fn cmd_presets(
    slug: Option<&str>,
    containers_path: Option<&str>,
    rules_path: Option<&str>,
) -> Result<(), String> {
    let slug = match slug {
        Some(s) => s,
        None => {
            for preset in PRESETS {
                println!("{:<12} {} ({} domains)", preset.slug, preset.name, preset.domains.len());
            }
            return Ok(());
        }
    };

    let preset = find_preset(slug).ok_or_else(|| format!("unknown preset '{slug}'"))?;
    let (containers_path, rules_path) = match (containers_path, rules_path) {
        (Some(c), Some(r)) => (c, r),
        _ => return Err("applying a preset needs --containers and --rules".to_string()),
    };

    let dir = load_directory(containers_path)?;
    let container = find_container_for_preset(&dir, preset)
        .ok_or_else(|| format!("no container for preset '{}'; create one named \"{}\"", slug, preset.name))?;

    let mut set = if Path::new(rules_path).exists() {
        load_rules(rules_path)?
    } else {
        RuleSet::new()
    };

    let existing: Vec<String> = set.rules().iter().map(identity_key).collect();
    let mut added = 0usize;
    let mut skipped = 0usize;

    for new in expand_preset(preset, &container.id) {
        let keys = preset_rule_identity_keys(&new.pattern, &container.id);
        if keys.iter().any(|k| existing.contains(k)) {
            skipped += 1;
            continue;
        }
        set.add_rule(new).map_err(|e| format!("failed to add preset rule: {e}"))?;
        added += 1;
    }

    set.save_json(Path::new(rules_path))
        .map_err(|e| format!("failed to write '{rules_path}': {e}"))?;

    println!(
        "Applied preset '{}' into container '{}': {} added, {} already present",
        slug, container.name, added, skipped
    );
    Ok(())
}
