use std::path::{Path, PathBuf};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "evidence-engine",
    about = "Apply hint rules, merge duplicate packages and normalize search terms for scanned dependencies",
    version
)]
pub struct Cli {
    /// JSON array of dependencies; `-` or omitted reads stdin
    pub input: Option<PathBuf>,

    /// Settings file [default: ./.evidence-engine/config.toml, fallback ~/.config/evidence-engine/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Extra hint rules: a path, URL or embedded resource name (overrides hints.file)
    #[arg(long, value_name = "LOCATION")]
    pub hints: Option<String>,

    /// Write the resolved JSON here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Analyze dependencies in parallel within each analyzer
    #[arg(long)]
    pub parallel: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// `None` when input comes from stdin.
    pub fn input_file(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|p| p.as_path() != Path::new("-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_means_stdin() {
        let cli = Cli::parse_from(["evidence-engine", "-"]);
        assert!(cli.input_file().is_none());
        let cli = Cli::parse_from(["evidence-engine"]);
        assert!(cli.input_file().is_none());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "evidence-engine",
            "deps.json",
            "--hints",
            "https://example.org/hints.xml",
            "--parallel",
            "-o",
            "out.json",
        ]);
        assert_eq!(cli.input_file(), Some(&PathBuf::from("deps.json")));
        assert_eq!(cli.hints.as_deref(), Some("https://example.org/hints.xml"));
        assert!(cli.parallel);
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["evidence-engine", "-v", "-q"]).is_err());
    }
}
