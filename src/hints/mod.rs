//! Declarative evidence corrections.
//!
//! - [`parser`]: reads the hint XML format into [`HintRuleSet`].
//! - [`loader`]: assembles the embedded base rules with an optional
//!   user-supplied file (local path, embedded resource or URL).
//!
//! [`apply_hints`] is the evaluation engine used by the hint analyzer.

pub mod loader;
pub mod parser;

use regex::Regex;

use crate::error::HintParseError;
use crate::evidence::{eq_ignore_case, Evidence, EvidenceType};
use crate::models::Dependency;

/// Matches a dependency's file name, literally or with a regular expression.
#[derive(Debug, Clone)]
pub struct FilenamePattern {
    value: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Literal { case_sensitive: bool },
    Regex(Regex),
}

impl FilenamePattern {
    pub fn literal(value: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            value: value.into(),
            matcher: Matcher::Literal { case_sensitive },
        }
    }

    /// A regular expression that must match the whole file name.
    pub fn regex(value: impl Into<String>, case_sensitive: bool) -> Result<Self, HintParseError> {
        let value = value.into();
        let flags = if case_sensitive { "" } else { "(?i)" };
        let re = Regex::new(&format!("{}^(?:{})$", flags, value)).map_err(|source| {
            HintParseError::Pattern {
                pattern: value.clone(),
                source,
            }
        })?;
        Ok(Self {
            value,
            matcher: Matcher::Regex(re),
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn matches(&self, file_name: &str) -> bool {
        match &self.matcher {
            Matcher::Literal { case_sensitive: true } => self.value == file_name,
            Matcher::Literal {
                case_sensitive: false,
            } => eq_ignore_case(&self.value, file_name),
            Matcher::Regex(re) => re.is_match(file_name),
        }
    }
}

/// Evidence sets for the three axes.
#[derive(Debug, Clone, Default)]
pub struct EvidenceSets {
    pub vendor: Vec<Evidence>,
    pub product: Vec<Evidence>,
    pub version: Vec<Evidence>,
}

impl EvidenceSets {
    pub fn get(&self, kind: EvidenceType) -> &[Evidence] {
        match kind {
            EvidenceType::Vendor => &self.vendor,
            EvidenceType::Product => &self.product,
            EvidenceType::Version => &self.version,
        }
    }

    pub fn push(&mut self, kind: EvidenceType, evidence: Evidence) {
        match kind {
            EvidenceType::Vendor => self.vendor.push(evidence),
            EvidenceType::Product => self.product.push(evidence),
            EvidenceType::Version => self.version.push(evidence),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vendor.is_empty() && self.product.is_empty() && self.version.is_empty()
    }
}

const AXES: [EvidenceType; 3] = [
    EvidenceType::Vendor,
    EvidenceType::Product,
    EvidenceType::Version,
];

/// Adds and removes evidence when any of its `given` conditions holds.
#[derive(Debug, Clone, Default)]
pub struct HintRule {
    pub given: EvidenceSets,
    pub filename_patterns: Vec<FilenamePattern>,
    pub add: EvidenceSets,
    pub remove: EvidenceSets,
}

impl HintRule {
    /// True when one given evidence entry is present or one filename pattern
    /// matches. Vendor, product, version and file name are tested in that
    /// order, stopping at the first hit.
    pub fn matches(&self, dependency: &Dependency) -> bool {
        AXES.iter().any(|&kind| {
            self.given
                .get(kind)
                .iter()
                .any(|e| dependency.evidence(kind).contains(e))
        }) || self
            .filename_patterns
            .iter()
            .any(|p| p.matches(&dependency.file_name))
    }
}

/// Adds `duplicate` as vendor evidence wherever a vendor value equals `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorDuplicatingHintRule {
    pub value: String,
    pub duplicate: String,
}

impl VendorDuplicatingHintRule {
    pub fn new(value: impl Into<String>, duplicate: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            duplicate: duplicate.into(),
        }
    }
}

/// Every rule loaded for a run. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct HintRuleSet {
    pub hint_rules: Vec<HintRule>,
    pub vendor_duplicating_rules: Vec<VendorDuplicatingHintRule>,
}

impl HintRuleSet {
    pub fn extend(&mut self, other: HintRuleSet) {
        self.hint_rules.extend(other.hint_rules);
        self.vendor_duplicating_rules
            .extend(other.vendor_duplicating_rules);
    }
}

/// Apply `rules` and then `vendor_rules` to `dependency`.
///
/// Rules are evaluated against the dependency as it stands after earlier
/// rules fired. Within one rule, matching and planning are read-only and the
/// planned additions and removals are applied afterwards. Vendor duplicates
/// are collected over a full scan before any is added, so they never trigger
/// further duplication in the same pass.
pub fn apply_hints(
    dependency: &mut Dependency,
    rules: &[HintRule],
    vendor_rules: &[VendorDuplicatingHintRule],
) {
    for rule in rules {
        if !rule.matches(dependency) {
            continue;
        }
        for kind in AXES {
            let evidence = dependency.evidence_mut(kind);
            for e in rule.add.get(kind) {
                evidence.add(e.clone());
            }
            for e in rule.remove.get(kind) {
                evidence.remove(e);
            }
        }
    }

    let duplicates: Vec<Evidence> = dependency
        .vendor
        .iter()
        .flat_map(|e| {
            vendor_rules
                .iter()
                .filter(|r| eq_ignore_case(&r.value, e.value()))
                .map(move |r| {
                    Evidence::new(
                        format!("{} (hint)", e.source()),
                        e.name(),
                        r.duplicate.clone(),
                        e.confidence(),
                    )
                })
        })
        .collect();

    for e in duplicates {
        dependency.vendor.add(e);
    }
}
