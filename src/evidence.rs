use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordinal weight attached to a piece of evidence.
///
/// Confidence never decides whether evidence is kept; it only ranks matches
/// later on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
    Highest,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "LOW"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::High => write!(f, "HIGH"),
            Confidence::Highest => write!(f, "HIGHEST"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Confidence::Low),
            "MEDIUM" => Ok(Confidence::Medium),
            "HIGH" => Ok(Confidence::High),
            "HIGHEST" => Ok(Confidence::Highest),
            other => Err(format!("unknown confidence '{}'", other)),
        }
    }
}

/// The identity axis a piece of evidence describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceType {
    Vendor,
    Product,
    Version,
}

impl fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvidenceType::Vendor => write!(f, "vendor"),
            EvidenceType::Product => write!(f, "product"),
            EvidenceType::Version => write!(f, "version"),
        }
    }
}

impl FromStr for EvidenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vendor" => Ok(EvidenceType::Vendor),
            "product" => Ok(EvidenceType::Product),
            "version" => Ok(EvidenceType::Version),
            other => Err(format!("unknown evidence type '{}'", other)),
        }
    }
}

/// A single weighted observation about a dependency's vendor, product or version.
///
/// Two pieces of evidence are equal when their `source`, `name` and `value`
/// match ignoring case. `confidence` is not part of the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    source: String,
    name: String,
    value: String,
    confidence: Confidence,
}

impl Evidence {
    pub fn new(
        source: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            value: value.into(),
            confidence,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }
}

impl PartialEq for Evidence {
    fn eq(&self, other: &Self) -> bool {
        eq_ignore_case(&self.source, &other.source)
            && eq_ignore_case(&self.name, &other.name)
            && eq_ignore_case(&self.value, &other.value)
    }
}

impl Eq for Evidence {}

impl Hash for Evidence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_folded(&self.source, state);
        hash_folded(&self.name, state);
        hash_folded(&self.value, state);
    }
}

/// Case-insensitive comparison with full Unicode lowercase folding, so
/// `"SOCIÉTÉ"` equals `"société"`.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Hashes the same folded characters [`eq_ignore_case`] compares.
fn hash_folded<H: Hasher>(s: &str, state: &mut H) {
    for c in s.chars().flat_map(char::to_lowercase) {
        c.hash(state);
    }
    // field terminator
    0xffu8.hash(state);
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}={} ({})",
            self.source, self.name, self.value, self.confidence
        )
    }
}

/// Duplicate-free evidence for one axis of a dependency, kept in insertion
/// order until a removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Evidence>", into = "Vec<Evidence>")]
pub struct EvidenceCollection {
    entries: Vec<Evidence>,
}

impl EvidenceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `evidence`. An equal entry already present keeps its place and
    /// takes the higher of the two confidences.
    pub fn add(&mut self, evidence: Evidence) {
        match self.entries.iter_mut().find(|e| **e == evidence) {
            Some(existing) => {
                if evidence.confidence > existing.confidence {
                    *existing = evidence;
                }
            }
            None => self.entries.push(evidence),
        }
    }

    /// Remove the entry equal to `evidence`; returns whether one was present.
    /// The last entry takes the removed one's place.
    pub fn remove(&mut self, evidence: &Evidence) -> bool {
        match self.entries.iter().position(|e| e == evidence) {
            Some(idx) => {
                self.entries.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, evidence: &Evidence) -> bool {
        self.entries.iter().any(|e| e == evidence)
    }

    /// True when any entry carries `value`, ignoring case.
    pub fn contains_value(&self, value: &str) -> bool {
        self.entries.iter().any(|e| eq_ignore_case(&e.value, value))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Evidence> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose confidence is at least `min`.
    pub fn values_at_least(&self, min: Confidence) -> impl Iterator<Item = &Evidence> {
        self.entries.iter().filter(move |e| e.confidence >= min)
    }

    /// Space-joined values of every entry at or above `min`, the raw text fed
    /// to the search field analyzer.
    pub fn text(&self, min: Confidence) -> String {
        self.values_at_least(min)
            .map(Evidence::value)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Extend<Evidence> for EvidenceCollection {
    fn extend<T: IntoIterator<Item = Evidence>>(&mut self, iter: T) {
        for evidence in iter {
            self.add(evidence);
        }
    }
}

impl FromIterator<Evidence> for EvidenceCollection {
    fn from_iter<T: IntoIterator<Item = Evidence>>(iter: T) -> Self {
        let mut collection = EvidenceCollection::new();
        collection.extend(iter);
        collection
    }
}

impl<'a> IntoIterator for &'a EvidenceCollection {
    type Item = &'a Evidence;
    type IntoIter = std::slice::Iter<'a, Evidence>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl From<Vec<Evidence>> for EvidenceCollection {
    fn from(entries: Vec<Evidence>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<EvidenceCollection> for Vec<Evidence> {
    fn from(collection: EvidenceCollection) -> Self {
        collection.entries
    }
}
