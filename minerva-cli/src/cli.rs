//! Command-line arguments for the Minerva binaries.
//!
//! Each binary runs top to bottom; there are no subcommands. Only the
//! shared options and the image positionals are declared here.

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

/// Options accepted by every binary.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Path to the configuration file (default: ./minerva.toml if present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Summary output format.
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}

/// Positional arguments of the image build.
#[derive(Args, Debug, Clone, Default)]
pub struct ImageArgs {
    /// Version tag for the image (default: 0.1.0).
    #[arg(id = "image_version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Pass exactly `push` to publish both tags after a passing smoke test.
    pub push: Option<String>,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Provision system packages, the Python environment and ML assets.
#[derive(Parser, Debug)]
#[command(name = "minerva-setup", version, about, long_about = None)]
pub struct SetupCli {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Run unit, integration, storage and accuracy checks, stopping at the first
/// failure.
#[derive(Parser, Debug)]
#[command(name = "minerva-test", version, about, long_about = None)]
pub struct TestCli {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Build, smoke-test and optionally publish the container image.
#[derive(Parser, Debug)]
#[command(name = "minerva-build", version, about, long_about = None)]
pub struct BuildCli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub image: ImageArgs,
}

/// Setup, then tests, then the image build; each only if the previous one
/// succeeded.
#[derive(Parser, Debug)]
#[command(name = "minerva-pipeline", version, about, long_about = None)]
pub struct PipelineCli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub image: ImageArgs,
}
