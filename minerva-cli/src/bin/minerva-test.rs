//! Run the Minerva test suite, stopping at the first failing category.

use std::process::ExitCode;

use clap::Parser;

use minerva_cli::cli::{ImageArgs, TestCli};
use minerva_cli::{Component, run_binary};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = TestCli::parse();
    run_binary(Component::Test, cli.common, ImageArgs::default()).await
}
