use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::evidence::{EvidenceCollection, EvidenceType};

/// One physical file discovered during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub file_path: PathBuf,
    /// Where the file actually lives; differs from `file_path` when the file
    /// was extracted from an archive into a temp directory.
    #[serde(default)]
    pub actual_file_path: PathBuf,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub ecosystem: Ecosystem,
    /// Logical grouping key used to recognise files of one installed package.
    #[serde(default)]
    pub package_path: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vendor: EvidenceCollection,
    #[serde(default)]
    pub product: EvidenceCollection,
    #[serde(default)]
    pub version: EvidenceCollection,
    #[serde(default)]
    pub related_dependencies: Vec<Dependency>,
    #[serde(default)]
    pub project_references: BTreeSet<String>,
}

impl Dependency {
    /// Create a dependency for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let file_path = path.into();
        let file_name = file_name_of(&file_path);
        Self {
            actual_file_path: file_path.clone(),
            file_path,
            file_name,
            sha256: String::new(),
            ecosystem: Ecosystem::Unknown,
            package_path: None,
            name: None,
            vendor: EvidenceCollection::new(),
            product: EvidenceCollection::new(),
            version: EvidenceCollection::new(),
            related_dependencies: Vec::new(),
            project_references: BTreeSet::new(),
        }
    }

    /// Fill in fields an external analyzer may have left empty after
    /// deserialization.
    pub fn normalize(&mut self) {
        if self.actual_file_path.as_os_str().is_empty() {
            self.actual_file_path = self.file_path.clone();
        }
        if self.file_name.is_empty() {
            self.file_name = file_name_of(&self.file_path);
        }
    }

    /// Hash the actual file contents (SHA-256, lowercase hex) into `sha256`.
    pub fn compute_hash(&mut self) -> std::io::Result<()> {
        let bytes = std::fs::read(&self.actual_file_path)?;
        self.sha256 = format!("{:x}", Sha256::digest(&bytes));
        Ok(())
    }

    pub fn evidence(&self, kind: EvidenceType) -> &EvidenceCollection {
        match kind {
            EvidenceType::Vendor => &self.vendor,
            EvidenceType::Product => &self.product,
            EvidenceType::Version => &self.version,
        }
    }

    pub fn evidence_mut(&mut self, kind: EvidenceType) -> &mut EvidenceCollection {
        match kind {
            EvidenceType::Vendor => &mut self.vendor,
            EvidenceType::Product => &mut self.product,
            EvidenceType::Version => &mut self.version,
        }
    }

    pub fn add_related_dependency(&mut self, dependency: Dependency) {
        self.related_dependencies.push(dependency);
    }

    /// Detach and return every related dependency.
    pub fn take_related_dependencies(&mut self) -> Vec<Dependency> {
        std::mem::take(&mut self.related_dependencies)
    }

    pub fn add_project_references<I>(&mut self, references: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.project_references.extend(references);
    }

    /// Name of the directory directly containing `actual_file_path`.
    pub fn actual_parent_name(&self) -> Option<&str> {
        self.actual_file_path
            .parent()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Package ecosystem a dependency was identified in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Ruby,
    Swift,
    CocoaPods,
    Java,
    Node,
    Python,
    Rust,
    DotNet,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ecosystem::Ruby => write!(f, "Ruby"),
            Ecosystem::Swift => write!(f, "Swift"),
            Ecosystem::CocoaPods => write!(f, "CocoaPods"),
            Ecosystem::Java => write!(f, "Java"),
            Ecosystem::Node => write!(f, "Node"),
            Ecosystem::Python => write!(f, "Python"),
            Ecosystem::Rust => write!(f, "Rust"),
            Ecosystem::DotNet => write!(f, ".NET"),
            Ecosystem::Unknown => write!(f, "Unknown"),
        }
    }
}
