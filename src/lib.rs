//! `evidence-engine`: resolve what a dependency file is from weighted evidence.
//!
//! # Flow
//! 1. Load [`config::Settings`] ([`config::load_settings`]).
//! 2. Register analyzers on an [`engine::Engine`] and add the scanned
//!    [`models::Dependency`] records with their raw [`evidence`].
//! 3. [`engine::Engine::run`] initializes every enabled analyzer, then runs
//!    them phase by phase:
//!    - [`analyzer::hint`] corrects evidence with [`hints`] rules,
//!    - [`analyzer::package_path`] groups files of one installed package,
//!    - [`analyzer::merge`] folds duplicate records into one.
//! 4. Feed the surviving evidence through [`text::SearchFieldAnalyzer`] to
//!    build search terms for identifier lookup.

pub mod analyzer;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod fetch;
pub mod hints;
pub mod models;
pub mod resources;
pub mod text;

pub use engine::Engine;
pub use error::EngineError;
