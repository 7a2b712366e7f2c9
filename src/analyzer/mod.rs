use std::fmt;

use rayon::prelude::*;

use crate::config::Settings;
use crate::error::{AnalysisError, AnalysisFailure, InitializationError};
use crate::models::Dependency;

pub mod hint;
pub mod merge;
pub mod package_path;

/// Ordered stages of a run. Analyzers of an earlier phase finish on every
/// dependency before any analyzer of a later phase starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnalysisPhase {
    Initial,
    PreInformationCollection,
    InformationCollection,
    PostInformationCollection,
    PreIdentifierAnalysis,
    IdentifierAnalysis,
    PostIdentifierAnalysis,
    Final,
}

impl fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisPhase::Initial => "initial",
            AnalysisPhase::PreInformationCollection => "pre-information-collection",
            AnalysisPhase::InformationCollection => "information-collection",
            AnalysisPhase::PostInformationCollection => "post-information-collection",
            AnalysisPhase::PreIdentifierAnalysis => "pre-identifier-analysis",
            AnalysisPhase::IdentifierAnalysis => "identifier-analysis",
            AnalysisPhase::PostIdentifierAnalysis => "post-identifier-analysis",
            AnalysisPhase::Final => "final",
        };
        write!(f, "{}", name)
    }
}

/// A pipeline stage bound to one [`AnalysisPhase`].
///
/// After [`Analyzer::initialize`] an analyzer is read-only: it keeps no
/// per-dependency state, so `analyze_dependency` may run concurrently on
/// distinct dependencies.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;

    fn phase(&self) -> AnalysisPhase;

    fn is_enabled(&self, settings: &Settings) -> bool;

    /// One-time setup. A failure aborts the run before any dependency is
    /// analyzed.
    fn initialize(&mut self, _settings: &Settings) -> Result<(), InitializationError> {
        Ok(())
    }

    /// Analyze a single dependency.
    fn analyze_dependency(&self, dependency: &mut Dependency) -> Result<(), AnalysisError>;

    /// Analyze the working set. Failures on one dependency do not stop the
    /// others; they are returned to the caller.
    ///
    /// Analyzers that work across dependencies (merging) override this and
    /// may shrink `dependencies`.
    fn analyze(&self, dependencies: &mut Vec<Dependency>, parallel: bool) -> Vec<AnalysisFailure> {
        let run = |dependency: &mut Dependency| {
            self.analyze_dependency(dependency)
                .err()
                .map(|error| AnalysisFailure {
                    analyzer: self.name().to_string(),
                    file_path: dependency.file_path.clone(),
                    error,
                })
        };

        if parallel {
            dependencies.par_iter_mut().filter_map(run).collect()
        } else {
            dependencies.iter_mut().filter_map(run).collect()
        }
    }
}
