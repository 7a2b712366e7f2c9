use tracing::{debug, info, warn};

use crate::analyzer::hint::HintAnalyzer;
use crate::analyzer::merge::DependencyMergingAnalyzer;
use crate::analyzer::package_path::PackagePathAnalyzer;
use crate::analyzer::Analyzer;
use crate::config::Settings;
use crate::error::{AnalysisFailure, EngineError};
use crate::models::Dependency;

/// Runs registered analyzers over the working set of dependencies.
///
/// Phases run in order; within a phase analyzers run in registration order
/// and each sees the working set as left by the previous one.
pub struct Engine {
    settings: Settings,
    analyzers: Vec<Box<dyn Analyzer>>,
    dependencies: Vec<Dependency>,
}

impl Engine {
    /// An engine with no analyzers registered.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            analyzers: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// An engine with the hint, package path and merging analyzers.
    pub fn with_default_analyzers(settings: Settings) -> Self {
        let mut engine = Self::new(settings);
        engine.register(Box::new(HintAnalyzer::new()));
        engine.register(Box::new(PackagePathAnalyzer::ruby_bundler()));
        engine.register(Box::new(PackagePathAnalyzer::ruby_gemspec()));
        engine.register(Box::new(PackagePathAnalyzer::swift_package_manager()));
        engine.register(Box::new(PackagePathAnalyzer::cocoapods()));
        engine.register(Box::new(DependencyMergingAnalyzer::new()));
        engine
    }

    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    pub fn add_dependency(&mut self, dependency: Dependency) {
        self.dependencies.push(dependency);
    }

    pub fn add_dependencies<I>(&mut self, dependencies: I)
    where
        I: IntoIterator<Item = Dependency>,
    {
        self.dependencies.extend(dependencies);
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn into_dependencies(self) -> Vec<Dependency> {
        self.dependencies
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Initialize every enabled analyzer, then analyze.
    ///
    /// An initialization failure returns before any dependency is touched.
    /// Per-dependency failures do not stop the run; they are returned together
    /// as [`EngineError::Analysis`] once every phase has completed.
    pub fn run(&mut self) -> Result<(), EngineError> {
        let settings = &self.settings;
        let mut active: Vec<&mut Box<dyn Analyzer>> = Vec::new();
        for analyzer in self.analyzers.iter_mut() {
            if !analyzer.is_enabled(settings) {
                debug!("{} is disabled", analyzer.name());
                continue;
            }
            analyzer
                .initialize(settings)
                .map_err(|source| EngineError::Initialization {
                    analyzer: analyzer.name().to_string(),
                    source,
                })?;
            active.push(analyzer);
        }

        // Stable sort keeps registration order within a phase.
        active.sort_by_key(|a| a.phase());

        let parallel = settings.analysis.parallel;
        let mut failures: Vec<AnalysisFailure> = Vec::new();
        let mut current_phase = None;
        for analyzer in active {
            if current_phase != Some(analyzer.phase()) {
                current_phase = Some(analyzer.phase());
                info!(
                    "Phase {}: {} dependencies",
                    analyzer.phase(),
                    self.dependencies.len()
                );
            }
            debug!("Running {}", analyzer.name());
            let found = analyzer.analyze(&mut self.dependencies, parallel);
            for failure in &found {
                warn!("{}", failure);
            }
            failures.extend(found);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Analysis(failures))
        }
    }
}
