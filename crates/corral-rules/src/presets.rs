//! Preset rule bundles for common services
//!
//! Each preset expands a short domain list into one domain/include rule
//! per domain. Identity-key helpers let a merge recognize rules the user
//! already has, including under the legacy glob pattern conventions older
//! exports used.

use corral_core::types::{MatchType, RuleMetadata, RuleType};

use crate::directory::{ContainerDirectory, ContainerInfo};
use crate::duplicates::identity_key_parts;
use crate::store::NewRule;

/// A common-service rule bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub slug: &'static str,
    pub name: &'static str,
    pub domains: &'static [&'static str],
}

impl Preset {
    /// The category marker a container created for this preset carries.
    pub fn marker(&self) -> String {
        format!("preset:{}", self.slug)
    }
}

/// Static catalog of bundles, one entry per service family.
pub const PRESETS: &[Preset] = &[
    Preset {
        slug: "google",
        name: "Google",
        domains: &[
            "google.com",
            "gmail.com",
            "youtube.com",
            "googleusercontent.com",
            "gstatic.com",
        ],
    },
    Preset {
        slug: "microsoft",
        name: "Microsoft",
        domains: &[
            "microsoft.com",
            "live.com",
            "office.com",
            "outlook.com",
            "microsoftonline.com",
        ],
    },
    Preset {
        slug: "meta",
        name: "Meta",
        domains: &[
            "facebook.com",
            "instagram.com",
            "whatsapp.com",
            "messenger.com",
            "fbcdn.net",
        ],
    },
    Preset {
        slug: "amazon",
        name: "Amazon",
        domains: &["amazon.com", "amazon.co.uk", "amazon.de", "aws.amazon.com", "audible.com"],
    },
    Preset {
        slug: "dev",
        name: "Development",
        domains: &[
            "github.com",
            "gitlab.com",
            "bitbucket.org",
            "stackoverflow.com",
            "npmjs.com",
            "crates.io",
        ],
    },
    Preset {
        slug: "banking",
        name: "Banking",
        domains: &["paypal.com", "wise.com", "revolut.com", "stripe.com"],
    },
    Preset {
        slug: "social",
        name: "Social",
        domains: &["twitter.com", "x.com", "reddit.com", "linkedin.com", "mastodon.social"],
    },
    Preset {
        slug: "streaming",
        name: "Streaming",
        domains: &["netflix.com", "spotify.com", "twitch.tv", "disneyplus.com"],
    },
];

pub fn find_preset(slug: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.slug.eq_ignore_ascii_case(slug))
}

// =============================================================================
// Expansion
// =============================================================================

/// Expand a preset into creation requests, deduplicated by normalized
/// domain within the bundle.
pub fn expand_preset(preset: &Preset, container_id: &str) -> Vec<NewRule> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(preset.domains.len());

    for domain in preset.domains {
        let normalized = domain.trim().to_lowercase();
        if normalized.is_empty() || !seen.insert(normalized.clone()) {
            continue;
        }
        out.push(NewRule {
            pattern: normalized,
            match_type: MatchType::Domain,
            rule_type: RuleType::Include,
            container_id: Some(container_id.to_string()),
            priority: None,
            enabled: None,
            metadata: RuleMetadata {
                description: None,
                source: Some(preset.marker()),
                tags: Vec::new(),
            },
        });
    }

    out
}

// =============================================================================
// Identity Keys Across Conventions
// =============================================================================

/// Identity keys under which an existing rule counts as "already covers
/// this preset domain": the canonical domain-style key plus the two
/// legacy glob shapes older rule exports used for the same intent.
pub fn preset_rule_identity_keys(domain: &str, container_id: &str) -> Vec<String> {
    let domain = domain.trim().to_lowercase();
    let include = RuleType::Include.as_str();
    vec![
        identity_key_parts(&domain, MatchType::Domain.as_str(), include, Some(container_id)),
        identity_key_parts(
            &format!("*://{domain}/*"),
            MatchType::Glob.as_str(),
            include,
            Some(container_id),
        ),
        identity_key_parts(
            &format!("*://*.{domain}/*"),
            MatchType::Glob.as_str(),
            include,
            Some(container_id),
        ),
    ]
}

/// Resolve an existing container to reuse for a preset: exact
/// case-insensitive name match first, then the reserved category marker.
/// Returns None when the host should create a fresh container.
pub fn find_container_for_preset<D: ContainerDirectory>(
    directory: &D,
    preset: &Preset,
) -> Option<ContainerInfo> {
    if let Some(found) = directory.by_name(preset.name) {
        return Some(found);
    }
    let marker = preset.marker();
    directory
        .all()
        .into_iter()
        .find(|c| c.marker.as_deref() == Some(marker.as_str()))
}
