use tracing::debug;

use crate::config::Settings;
use crate::error::{AnalysisError, AnalysisFailure};
use crate::evidence::{eq_ignore_case, EvidenceType};
use crate::models::Dependency;

use super::{AnalysisPhase, Analyzer};

const SPECIFICATIONS: &str = "specifications";
const GEMSPEC: &str = ".gemspec";
const PODSPEC: &str = ".podspec";
const SPM_FILE_NAME: &str = "Package.swift";

/// Which side of a compared pair survives a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primary {
    First,
    Second,
}

/// An ecosystem heuristic deciding that two files describe one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// `.gemspec` files sharing a package path.
    RubyGemspec,
    /// `Package.swift` and `.podspec` files sharing a package path.
    SwiftPackage,
}

impl MergeRule {
    /// Rules evaluated by [`DependencyMergingAnalyzer::new`], in order.
    pub const ALL: &'static [MergeRule] = &[MergeRule::RubyGemspec, MergeRule::SwiftPackage];

    pub fn matches(&self, a: &Dependency, b: &Dependency) -> bool {
        let accepted = |d: &Dependency| match self {
            MergeRule::RubyGemspec => d.file_name.ends_with(GEMSPEC),
            MergeRule::SwiftPackage => {
                d.file_name.ends_with(PODSPEC) || d.file_name == SPM_FILE_NAME
            }
        };
        accepted(a) && accepted(b) && same_package_path(a, b)
    }

    /// The survivor of a pair already known to match.
    pub fn primary(&self, a: &Dependency, _b: &Dependency) -> Primary {
        let first_wins = match self {
            // The bundler stub carries the fully resolved metadata.
            MergeRule::RubyGemspec => a
                .actual_parent_name()
                .map_or(false, |n| n.eq_ignore_ascii_case(SPECIFICATIONS)),
            MergeRule::SwiftPackage => a.file_name.ends_with(PODSPEC),
        };
        if first_wins {
            Primary::First
        } else {
            Primary::Second
        }
    }
}

fn same_package_path(a: &Dependency, b: &Dependency) -> bool {
    match (&a.package_path, &b.package_path) {
        (Some(x), Some(y)) => eq_ignore_case(x, y),
        _ => false,
    }
}

/// Fold `secondary` into `primary`.
///
/// Evidence is unioned, `secondary`'s related dependencies move to `primary`,
/// project references are unioned when both hash to the same content, and
/// `secondary` itself becomes a related dependency of `primary`.
pub fn merge_dependencies(primary: &mut Dependency, mut secondary: Dependency) {
    debug!(
        "Merging '{}' into '{}'",
        secondary.file_path.display(),
        primary.file_path.display()
    );
    for kind in [
        EvidenceType::Vendor,
        EvidenceType::Product,
        EvidenceType::Version,
    ] {
        let incoming: Vec<_> = secondary.evidence(kind).iter().cloned().collect();
        primary.evidence_mut(kind).extend(incoming);
    }

    for related in secondary.take_related_dependencies() {
        primary.add_related_dependency(related);
    }

    if !primary.sha256.is_empty() && primary.sha256 == secondary.sha256 {
        primary.add_project_references(secondary.project_references.iter().cloned());
    }

    primary.add_related_dependency(secondary);
}

/// A planned merge of `secondary` into `primary`, both working-set indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStep {
    pub primary: usize,
    pub secondary: usize,
}

/// Collapses dependencies that describe one logical package.
pub struct DependencyMergingAnalyzer {
    rules: Vec<MergeRule>,
}

impl DependencyMergingAnalyzer {
    pub fn new() -> Self {
        Self::with_rules(MergeRule::ALL.to_vec())
    }

    pub fn with_rules(rules: Vec<MergeRule>) -> Self {
        Self { rules }
    }

    /// Compare every pair `i < j` and decide the merges, without touching the
    /// dependencies. Entries already planned for removal are skipped; once
    /// `i` is merged into a later entry it is not compared again.
    pub fn plan(&self, dependencies: &[Dependency]) -> Vec<MergeStep> {
        let mut removed = vec![false; dependencies.len()];
        let mut steps = Vec::new();

        for i in 0..dependencies.len() {
            if removed[i] {
                continue;
            }
            for j in (i + 1)..dependencies.len() {
                if removed[j] {
                    continue;
                }
                let (a, b) = (&dependencies[i], &dependencies[j]);
                let Some(rule) = self.rules.iter().find(|r| r.matches(a, b)) else {
                    continue;
                };
                match rule.primary(a, b) {
                    Primary::First => {
                        steps.push(MergeStep {
                            primary: i,
                            secondary: j,
                        });
                        removed[j] = true;
                    }
                    Primary::Second => {
                        steps.push(MergeStep {
                            primary: j,
                            secondary: i,
                        });
                        removed[i] = true;
                        break;
                    }
                }
            }
        }
        steps
    }

    /// Apply `steps` in order and drop the absorbed entries.
    pub fn apply(dependencies: &mut Vec<Dependency>, steps: &[MergeStep]) {
        let mut slots: Vec<Option<Dependency>> = dependencies.drain(..).map(Some).collect();
        for step in steps {
            let Some(secondary) = slots[step.secondary].take() else {
                continue;
            };
            match slots[step.primary].as_mut() {
                Some(primary) => merge_dependencies(primary, secondary),
                None => slots[step.secondary] = Some(secondary),
            }
        }
        dependencies.extend(slots.into_iter().flatten());
    }
}

impl Default for DependencyMergingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for DependencyMergingAnalyzer {
    fn name(&self) -> &str {
        "Dependency Merging Analyzer"
    }

    fn phase(&self) -> AnalysisPhase {
        AnalysisPhase::PostInformationCollection
    }

    fn is_enabled(&self, settings: &Settings) -> bool {
        settings.analyzers.dependency_merging
    }

    /// Unused: merging compares pairs, so all work happens in [`Analyzer::analyze`].
    fn analyze_dependency(&self, _dependency: &mut Dependency) -> Result<(), AnalysisError> {
        Ok(())
    }

    fn analyze(&self, dependencies: &mut Vec<Dependency>, _parallel: bool) -> Vec<AnalysisFailure> {
        let steps = self.plan(dependencies);
        if !steps.is_empty() {
            debug!("{} dependencies merged", steps.len());
            Self::apply(dependencies, &steps);
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{Confidence, Evidence};
    use std::collections::HashSet;

    fn gem(path: &str, package_path: Option<&str>, product: &str) -> Dependency {
        let mut d = Dependency::new(path);
        d.package_path = package_path.map(str::to_string);
        d.product
            .add(Evidence::new("gemspec", "name", product, Confidence::High));
        d
    }

    fn run(deps: &mut Vec<Dependency>) {
        let failures = DependencyMergingAnalyzer::new().analyze(deps, false);
        assert!(failures.is_empty());
    }

    #[test]
    fn test_gem_merge_prefers_specifications_stub() {
        let mut deps = vec![
            gem("/app/vendor/gems/foo-1.0/foo.gemspec", Some("/app/vendor/gems/foo-1.0"), "foo"),
            gem(
                "/app/vendor/specifications/foo.gemspec",
                Some("/APP/vendor/gems/foo-1.0"),
                "foo-stub",
            ),
        ];
        run(&mut deps);

        assert_eq!(deps.len(), 1);
        let survivor = &deps[0];
        assert_eq!(survivor.actual_parent_name(), Some("specifications"));
        assert_eq!(survivor.related_dependencies.len(), 1);
        assert!(survivor.related_dependencies[0]
            .file_path
            .ends_with("gems/foo-1.0/foo.gemspec"));
        assert!(survivor.product.contains_value("foo"));
        assert!(survivor.product.contains_value("foo-stub"));
    }

    #[test]
    fn test_stub_first_in_list_also_wins() {
        let mut deps = vec![
            gem("/v/specifications/foo.gemspec", Some("/v/gems/foo"), "a"),
            gem("/v/gems/foo/foo.gemspec", Some("/v/gems/foo"), "b"),
        ];
        run(&mut deps);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].actual_parent_name(), Some("specifications"));
    }

    #[test]
    fn test_missing_package_path_never_matches() {
        let a = gem("/v/a/foo.gemspec", None, "a");
        let b = gem("/v/b/foo.gemspec", None, "b");
        assert!(!MergeRule::RubyGemspec.matches(&a, &b));
        let mut deps = vec![a, b];
        run(&mut deps);
        assert_eq!(deps.len(), 2);
    }

    #[test]
    fn test_different_suffix_never_matches() {
        let a = gem("/v/foo/foo.gemspec", Some("/v/foo"), "a");
        let b = gem("/v/foo/Gemfile.lock", Some("/v/foo"), "b");
        assert!(!MergeRule::RubyGemspec.matches(&a, &b));
    }

    #[test]
    fn test_swift_podspec_wins_over_manifest() {
        let mut deps = vec![
            gem("/src/Alamofire/Package.swift", Some("/src/Alamofire"), "Alamofire"),
            gem("/src/Alamofire/Alamofire.podspec", Some("/src/alamofire"), "Alamofire"),
        ];
        run(&mut deps);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].file_name, "Alamofire.podspec");
        assert_eq!(deps[0].related_dependencies[0].file_name, "Package.swift");
    }

    #[test]
    fn test_related_dependencies_are_transferred() {
        let mut secondary = gem("/v/gems/foo/foo.gemspec", Some("/v/gems/foo"), "b");
        secondary.add_related_dependency(Dependency::new("/v/gems/foo/lib/foo.rb"));
        let mut primary = gem("/v/specifications/foo.gemspec", Some("/v/gems/foo"), "a");

        merge_dependencies(&mut primary, secondary);
        assert_eq!(primary.related_dependencies.len(), 2);
        let absorbed = primary
            .related_dependencies
            .iter()
            .find(|d| d.file_name == "foo.gemspec")
            .unwrap();
        assert!(absorbed.related_dependencies.is_empty());
    }

    #[test]
    fn test_project_references_union_only_for_same_hash() {
        let mut primary = Dependency::new("/m1/foo.gemspec");
        primary.sha256 = "abc".into();
        primary.project_references.insert("module-a".into());

        let mut same = Dependency::new("/m2/foo.gemspec");
        same.sha256 = "abc".into();
        same.project_references.insert("module-b".into());
        merge_dependencies(&mut primary, same);
        assert_eq!(primary.project_references.len(), 2);

        let mut other = Dependency::new("/m3/foo.gemspec");
        other.sha256 = "def".into();
        other.project_references.insert("module-c".into());
        merge_dependencies(&mut primary, other);
        assert_eq!(primary.project_references.len(), 2);
    }

    #[test]
    fn test_identical_records_merge_by_position() {
        let a = gem("/v/gems/foo/foo.gemspec", Some("/v/gems/foo"), "foo");
        let b = a.clone();
        let steps = DependencyMergingAnalyzer::new().plan(&[a, b]);
        assert_eq!(
            steps,
            vec![MergeStep {
                primary: 1,
                secondary: 0
            }]
        );
    }

    #[test]
    fn test_chain_of_three_collapses_to_one() {
        let mut deps = vec![
            gem("/v/gems/foo/a.gemspec", Some("/v/gems/foo"), "a"),
            gem("/v/gems/foo/b.gemspec", Some("/v/gems/foo"), "b"),
            gem("/v/gems/foo/c.gemspec", Some("/v/gems/foo"), "c"),
        ];
        run(&mut deps);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].file_name, "c.gemspec");
        assert_eq!(deps[0].product.len(), 3);
        assert_eq!(deps[0].related_dependencies.len(), 2);
    }

    fn evidence_set(d: &Dependency) -> HashSet<(EvidenceType, String)> {
        [EvidenceType::Vendor, EvidenceType::Product, EvidenceType::Version]
            .into_iter()
            .flat_map(move |k| {
                d.evidence(k)
                    .iter()
                    .map(move |e| (k, e.value().to_ascii_lowercase()))
            })
            .collect()
    }

    #[test]
    fn test_merge_order_independent() {
        let make = || {
            let mut a = gem("/v/a.gemspec", Some("/v"), "alpha");
            a.vendor.add(Evidence::new("gemspec", "author", "acme", Confidence::Low));
            let mut b = gem("/v/b.gemspec", Some("/v"), "beta");
            b.version.add(Evidence::new("gemspec", "version", "1.0", Confidence::High));
            let c = gem("/v/c.gemspec", Some("/v"), "alpha");
            (a, b, c)
        };

        let (mut a, b, c) = make();
        merge_dependencies(&mut a, b);
        let mut ab_c = c;
        merge_dependencies(&mut ab_c, a);

        let (a, mut b, c) = make();
        merge_dependencies(&mut b, c);
        let mut a_bc = a;
        merge_dependencies(&mut a_bc, b);

        assert_eq!(evidence_set(&ab_c), evidence_set(&a_bc));
        assert_eq!(ab_c.related_dependencies.len(), 2);
        assert_eq!(a_bc.related_dependencies.len(), 2);
    }
}
