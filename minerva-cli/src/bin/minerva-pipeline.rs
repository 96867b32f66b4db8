//! Run setup, tests and the image build in order.

use std::process::ExitCode;

use clap::Parser;

use minerva_cli::cli::PipelineCli;
use minerva_cli::{Component, run_binary};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = PipelineCli::parse();
    run_binary(Component::Pipeline, cli.common, cli.image).await
}
