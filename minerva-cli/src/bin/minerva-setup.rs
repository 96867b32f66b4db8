//! Provision the Minerva development environment.

use std::process::ExitCode;

use clap::Parser;

use minerva_cli::cli::{ImageArgs, SetupCli};
use minerva_cli::{Component, run_binary};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = SetupCli::parse();
    run_binary(Component::Setup, cli.common, ImageArgs::default()).await
}
