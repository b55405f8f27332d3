//! pipeline-init - Scan a repository and generate a CI pipeline for it.
//!
//! Every platform detector inspects the repository, describes the choices
//! a user still has to make as an option tree, and provides one pipeline
//! template per reachable configuration. Resolving a tree with a set of
//! answers selects a template and the environment variables to inject.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`error`] - Error types and result aliases
//! - [`options`] - Option trees, resolution and snapshots
//! - [`pipeline`] - Pipeline document model, step catalog and compiler
//! - [`scan`] - Scan orchestration and aggregated results
//! - [`scanners`] - Per-platform detectors
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use pipeline_init::pipeline::StepCatalog;
//! use pipeline_init::scan::Scanner;
//!
//! let repo = tempfile::TempDir::new().unwrap();
//! let catalog = Arc::new(StepCatalog::builtin().unwrap());
//!
//! let result = Scanner::new(catalog).scan(repo.path()).unwrap();
//! assert_eq!(result.platforms(), vec!["other"]);
//! ```

pub mod cli;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod scan;
pub mod scanners;
pub mod ui;

pub use error::{InitError, Result};
