//! `evidence-engine` binary: read scanned dependencies as JSON, resolve their
//! identity evidence and print the result.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load settings and apply command-line overrides.
//! 3. Read the dependency array (file or stdin), fill in paths and hashes.
//! 4. Run the default analyzer pipeline.
//! 5. Write resolved dependencies with their vendor/product search terms.
//! 6. Exit `0` (clean), `1` (some dependency failed) or `2` (initialization
//!    failed, nothing analyzed).

mod cli;

use std::io::{Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use cli::Cli;
use evidence_engine::config::load_settings;
use evidence_engine::evidence::Confidence;
use evidence_engine::models::Dependency;
use evidence_engine::text::SearchFieldAnalyzer;
use evidence_engine::{Engine, EngineError};

#[derive(Serialize)]
struct Resolved {
    #[serde(flatten)]
    dependency: Dependency,
    vendor_terms: Vec<String>,
    product_terms: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let project = std::env::current_dir().context("cannot determine working directory")?;
    let mut settings = load_settings(&project, cli.config.as_deref())?;
    if let Some(hints) = &cli.hints {
        settings.hints.file = Some(hints.clone());
    }
    if cli.parallel {
        settings.analysis.parallel = true;
    }

    let dependencies = read_dependencies(cli)?;
    let count = dependencies.len();

    let mut engine = Engine::with_default_analyzers(settings);
    engine.add_dependencies(dependencies);

    let code = match engine.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(EngineError::Initialization { analyzer, source }) => {
            eprintln!(
                "{} failed to initialize {}: {}",
                "error:".red().bold(),
                analyzer,
                source
            );
            return Ok(ExitCode::from(2));
        }
        Err(EngineError::Analysis(failures)) => {
            for failure in &failures {
                eprintln!("  {} {}", "✗".red(), failure);
            }
            ExitCode::from(1)
        }
    };

    let resolved = resolve_terms(engine.into_dependencies());
    if !cli.quiet {
        eprintln!(
            "  {} {} dependencies in, {} out",
            "→".cyan(),
            count,
            resolved.len()
        );
    }
    write_output(cli, &resolved)?;
    Ok(code)
}

fn read_dependencies(cli: &Cli) -> Result<Vec<Dependency>> {
    let content = match cli.input_file() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("cannot read stdin")?;
            buf
        }
    };

    let mut dependencies: Vec<Dependency> =
        serde_json::from_str(&content).context("input is not a JSON array of dependencies")?;
    for dep in &mut dependencies {
        dep.normalize();
        if dep.sha256.is_empty() && dep.actual_file_path.is_file() {
            if let Err(e) = dep.compute_hash() {
                debug!("cannot hash {}: {}", dep.actual_file_path.display(), e);
            }
        }
    }
    Ok(dependencies)
}

fn resolve_terms(dependencies: Vec<Dependency>) -> Vec<Resolved> {
    let mut analyzer = SearchFieldAnalyzer::new();
    dependencies
        .into_iter()
        .map(|dependency| {
            let vendor_terms = analyzer.terms(&dependency.vendor.text(Confidence::Low));
            let product_terms = analyzer.terms(&dependency.product.text(Confidence::Low));
            Resolved {
                dependency,
                vendor_terms,
                product_terms,
            }
        })
        .collect()
}

fn write_output(cli: &Cli, resolved: &[Resolved]) -> Result<()> {
    let json = serde_json::to_string_pretty(resolved)?;
    match &cli.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("cannot write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}
