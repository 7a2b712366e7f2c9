use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::AnalysisError;
use crate::models::{Dependency, Ecosystem};

use super::{AnalysisPhase, Analyzer};

const SPECIFICATIONS: &str = "specifications";
const GEMS: &str = "gems";
const GEMSPEC: &str = ".gemspec";
const PODSPEC: &str = ".podspec";
const SPM_FILE_NAME: &str = "Package.swift";

/// Assigns the package path that the merge analyzer groups files by.
///
/// Each instance is parameterized by the files it accepts and how it derives
/// the path; a specialised variant is a different `accept` function rather
/// than a subtype. An existing package path is never overwritten.
pub struct PackagePathAnalyzer {
    name: &'static str,
    ecosystem: Ecosystem,
    enabled: fn(&Settings) -> bool,
    accept: fn(&Path) -> bool,
    resolve: fn(&Dependency) -> Option<String>,
    package_name: Option<fn(&Dependency) -> Option<String>>,
}

impl PackagePathAnalyzer {
    pub fn new(
        name: &'static str,
        ecosystem: Ecosystem,
        enabled: fn(&Settings) -> bool,
        accept: fn(&Path) -> bool,
        resolve: fn(&Dependency) -> Option<String>,
    ) -> Self {
        Self {
            name,
            ecosystem,
            enabled,
            accept,
            resolve,
            package_name: None,
        }
    }

    /// Also fill in `Dependency::name` when it is unset.
    pub fn with_package_name(mut self, package_name: fn(&Dependency) -> Option<String>) -> Self {
        self.package_name = Some(package_name);
        self
    }

    /// `*.gemspec` files outside a bundler `specifications` directory.
    pub fn ruby_gemspec() -> Self {
        Self::new(
            "Ruby Gemspec Analyzer",
            Ecosystem::Ruby,
            |s| s.analyzers.ruby_gemspec,
            |p| has_suffix(p, GEMSPEC) && parent_name(p) != Some(SPECIFICATIONS),
            parent_of_file_path,
        )
    }

    /// Gemspec stubs written by `bundle install --deployment` into
    /// `<root>/specifications/`, resolved to the installed `<root>/gems/<name>`.
    pub fn ruby_bundler() -> Self {
        Self::new(
            "Ruby Bundler Analyzer",
            Ecosystem::Ruby,
            |s| s.analyzers.ruby_bundler,
            |p| has_suffix(p, GEMSPEC) && parent_name(p) == Some(SPECIFICATIONS),
            bundled_gem_dir,
        )
    }

    pub fn swift_package_manager() -> Self {
        Self::new(
            "SWIFT Package Manager Analyzer",
            Ecosystem::Swift,
            |s| s.analyzers.swift_package_manager,
            |p| p.file_name().and_then(|n| n.to_str()) == Some(SPM_FILE_NAME),
            parent_of_file_path,
        )
        .with_package_name(swift_package_name)
    }

    pub fn cocoapods() -> Self {
        Self::new(
            "CocoaPods Analyzer",
            Ecosystem::CocoaPods,
            |s| s.analyzers.cocoapods,
            |p| has_suffix(p, PODSPEC),
            parent_of_file_path,
        )
    }

    pub fn accepts(&self, path: &Path) -> bool {
        (self.accept)(path)
    }
}

impl Analyzer for PackagePathAnalyzer {
    fn name(&self) -> &str {
        self.name
    }

    fn phase(&self) -> AnalysisPhase {
        AnalysisPhase::InformationCollection
    }

    fn is_enabled(&self, settings: &Settings) -> bool {
        (self.enabled)(settings)
    }

    fn analyze_dependency(&self, dependency: &mut Dependency) -> Result<(), AnalysisError> {
        if !self.accepts(&dependency.actual_file_path) {
            return Ok(());
        }
        if dependency.ecosystem == Ecosystem::Unknown {
            dependency.ecosystem = self.ecosystem;
        }
        if dependency.package_path.is_none() {
            dependency.package_path = (self.resolve)(dependency);
        }
        if let Some(package_name) = self.package_name.filter(|_| dependency.name.is_none()) {
            dependency.name = package_name(dependency);
        }
        Ok(())
    }
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.ends_with(suffix))
}

fn parent_name(path: &Path) -> Option<&str> {
    path.parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
}

fn parent_of_file_path(dependency: &Dependency) -> Option<String> {
    dependency
        .file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.display().to_string())
}

/// The declared package name, else the directory holding `Package.swift`.
fn swift_package_name(dependency: &Dependency) -> Option<String> {
    dependency
        .product
        .iter()
        .find(|e| e.source() == SPM_FILE_NAME && e.name() == "name")
        .map(|e| e.value().to_string())
        .or_else(|| dependency.actual_parent_name().map(str::to_string))
}

fn bundled_gem_dir(dependency: &Dependency) -> Option<String> {
    let gem_name = dependency.file_name.strip_suffix(GEMSPEC)?;
    let specifications = dependency.actual_file_path.parent()?;
    let installed = specifications.parent()?.join(GEMS).join(gem_name);
    if !installed.exists() {
        return None;
    }

    if dependency.actual_file_path == dependency.file_path {
        return Some(installed.display().to_string());
    }

    // Extracted from an archive: point into the archive's own layout.
    let spec_dir = dependency.file_path.parent()?;
    if spec_dir.file_name().and_then(|n| n.to_str()) != Some(SPECIFICATIONS) {
        return None;
    }
    let package_dir: PathBuf = spec_dir.parent()?.join(GEMS).join(gem_name);
    Some(package_dir.display().to_string())
}
