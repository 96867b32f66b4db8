//! Build, smoke-test and optionally publish the Minerva image.

use std::process::ExitCode;

use clap::Parser;

use minerva_cli::cli::BuildCli;
use minerva_cli::{Component, run_binary};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = BuildCli::parse();
    run_binary(Component::Build, cli.common, cli.image).await
}
