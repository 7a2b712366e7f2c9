use std::borrow::Cow;

use crate::config::Settings;
use crate::error::{AnalysisError, InitializationError};
use crate::hints::{apply_hints, loader, HintRuleSet};
use crate::models::Dependency;
use crate::resources;

use super::{AnalysisPhase, Analyzer};

/// Corrects systematic evidence noise with declarative hint rules.
///
/// The built-in rules are always loaded; `hints.file` in the settings adds
/// more.
pub struct HintAnalyzer {
    base: Cow<'static, str>,
    rules: HintRuleSet,
}

impl HintAnalyzer {
    /// Create a `HintAnalyzer` backed by the embedded base rules.
    pub fn new() -> Self {
        Self::with_base_rules(resources::BASE_HINTS)
    }

    /// Use `xml` in place of the embedded base rules.
    pub fn with_base_rules(xml: impl Into<Cow<'static, str>>) -> Self {
        Self {
            base: xml.into(),
            rules: HintRuleSet::default(),
        }
    }

    pub fn rules(&self) -> &HintRuleSet {
        &self.rules
    }
}

impl Default for HintAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for HintAnalyzer {
    fn name(&self) -> &str {
        "Hint Analyzer"
    }

    fn phase(&self) -> AnalysisPhase {
        AnalysisPhase::PreInformationCollection
    }

    fn is_enabled(&self, settings: &Settings) -> bool {
        settings.analyzers.hint
    }

    fn initialize(&mut self, settings: &Settings) -> Result<(), InitializationError> {
        self.rules = loader::load_rules(&self.base, settings)?;
        Ok(())
    }

    fn analyze_dependency(&self, dependency: &mut Dependency) -> Result<(), AnalysisError> {
        apply_hints(
            dependency,
            &self.rules.hint_rules,
            &self.rules.vendor_duplicating_rules,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{Confidence, Evidence};

    #[test]
    fn test_builtin_vendor_duplication() {
        let mut analyzer = HintAnalyzer::new();
        analyzer.initialize(&Settings::default()).unwrap();

        let mut dep = Dependency::new("/lib/commons-io-2.11.0.jar");
        dep.vendor.add(Evidence::new(
            "Manifest",
            "Implementation-Vendor",
            "The Apache Software Foundation",
            Confidence::High,
        ));
        analyzer.analyze_dependency(&mut dep).unwrap();

        let dup = dep.vendor.iter().find(|e| e.value() == "apache").unwrap();
        assert_eq!(dup.source(), "Manifest (hint)");
        assert_eq!(dep.vendor.len(), 2);
    }

    #[test]
    fn test_builtin_filename_rule() {
        let mut analyzer = HintAnalyzer::new();
        analyzer.initialize(&Settings::default()).unwrap();

        let mut dep = Dependency::new("/lib/jersey-core-1.19.jar");
        analyzer.analyze_dependency(&mut dep).unwrap();
        assert!(dep.vendor.contains_value("oracle"));
    }

    #[test]
    fn test_malformed_base_rules_fail_initialization() {
        let mut analyzer = HintAnalyzer::with_base_rules("<hints><hint>");
        let err = analyzer.initialize(&Settings::default()).unwrap_err();
        assert!(matches!(err, InitializationError::Hints(_)));
    }
}
