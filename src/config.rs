use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

/// Root configuration, deserialized from `.evidence-engine/config.toml`.
///
/// Created once at start-up and handed to the [`Engine`](crate::engine::Engine),
/// which passes it to every analyzer it initializes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory for temporary files; the system temp dir when unset.
    pub temp_directory: Option<PathBuf>,
    pub analyzers: AnalyzerToggles,
    pub hints: HintSettings,
    pub proxy: ProxySettings,
    pub download: DownloadSettings,
    pub analysis: AnalysisSettings,
}

/// Per-analyzer enable flags. Everything is on by default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerToggles {
    pub hint: bool,
    pub dependency_merging: bool,
    pub ruby_gemspec: bool,
    pub ruby_bundler: bool,
    pub swift_package_manager: bool,
    pub cocoapods: bool,
}

impl Default for AnalyzerToggles {
    fn default() -> Self {
        Self {
            hint: true,
            dependency_merging: true,
            ruby_gemspec: true,
            ruby_bundler: true,
            swift_package_manager: true,
            cocoapods: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HintSettings {
    /// Extra hint rules: a URL (`http`, `https`, `file`), a local path, or the
    /// name of an embedded resource.
    pub file: Option<String>,
}

/// Proxy used for the relaxed retry of a remote hint download.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Accept invalid TLS certificates on the relaxed retry.
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    pub timeout_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl DownloadSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Run per-dependency analysis in parallel within a phase.
    pub parallel: bool,
}

/// Load settings, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<project_path>/.evidence-engine/config.toml`
/// 3. `~/.config/evidence-engine/config.toml`
/// 4. Built-in [`Settings::default`]
pub fn load_settings(project_path: &Path, config_override: Option<&Path>) -> Result<Settings> {
    if let Some(path) = config_override {
        let content = std::fs::read_to_string(path)?;
        return Ok(toml::from_str(&content)?);
    }

    let project_config = project_path.join(".evidence-engine").join("config.toml");
    if project_config.exists() {
        let content = std::fs::read_to_string(&project_config)?;
        return Ok(toml::from_str(&content)?);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("evidence-engine")
            .join("config.toml");
        if home_config.exists() {
            let content = std::fs::read_to_string(&home_config)?;
            return Ok(toml::from_str(&content)?);
        }
    }

    Ok(Settings::default())
}
