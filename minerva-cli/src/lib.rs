//! Entry points of the Minerva pipeline.
//!
//! Four binaries share this library:
//!
//! - `minerva-setup`: provision the development environment
//! - `minerva-test`: run the test categories, fail-fast
//! - `minerva-build [VERSION] [PUSH]`: build, smoke-test, optionally publish
//! - `minerva-pipeline [VERSION] [PUSH]`: all three in order
//!
//! # Module Structure
//!
//! - [`cli`]: clap argument definitions
//! - [`app`]: config loading, component runs and exit-code mapping
//! - [`reporter`]: colored stage lines
//! - [`output`]: text/JSON run summaries
//! - [`logging`]: tracing subscriber setup
//! - [`error`]: `CliError`

pub mod app;
pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod reporter;

pub use app::{Component, ComponentRun, run_binary};
pub use error::CliError;
