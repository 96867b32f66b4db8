//! Wiring shared by the four binaries.
//!
//! ```text
//! load_config ──> init_tracing ──> component(s) ──> summary ──> ExitCode
//!                                   setup ─> test ─> build
//!                                   (each only if the previous succeeded)
//! ```

use std::process::ExitCode;

use colored::Colorize;

use minerva_bootstrap::Installer;
use minerva_core::command::{CommandRunner, SystemRunner};
use minerva_core::config::{DEFAULT_CONFIG_PATH, PipelineConfig};
use minerva_core::error::MinervaError;
use minerva_core::metrics::describe_metrics;
use minerva_core::report::Reporter;
use minerva_core::run::PipelineRun;
use minerva_image_builder::{
    ContainerEngine, DockerEngine, ImageArtifact, ImageBuilder, PublishRequest,
};
use minerva_test_runner::TestOrchestrator;

use crate::cli::{CommonArgs, ImageArgs, OutputFormat};
use crate::error::CliError;
use crate::logging::init_tracing;
use crate::output::{OutputWriter, PipelineReport, RunReport};
use crate::reporter::ConsoleReporter;

pub const COMPONENT_SETUP: &str = "setup";
pub const COMPONENT_TEST: &str = "test";
pub const COMPONENT_BUILD: &str = "build";

/// Which binary is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Setup,
    Test,
    Build,
    /// Setup, test and build chained.
    Pipeline,
}

/// Load configuration and apply command-line overrides.
///
/// An explicit `--config` must exist; the implicit `minerva.toml` may be
/// absent. A relative `work_dir` is anchored at the current directory.
pub async fn load_config(
    common: &CommonArgs,
    image: &ImageArgs,
) -> Result<PipelineConfig, CliError> {
    let mut config = match &common.config {
        Some(path) => PipelineConfig::load(path).await?,
        None => PipelineConfig::load_or_default(DEFAULT_CONFIG_PATH).await?,
    };

    if let Some(level) = &common.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(version) = &image.version {
        config.image.version = version.clone();
    }
    if config.general.work_dir.is_relative() {
        let cwd = std::env::current_dir().map_err(MinervaError::Io)?;
        config.general.work_dir = cwd.join(&config.general.work_dir);
    }

    config.validate()?;
    Ok(config)
}

/// Publishing is requested only by the second positional argument, and only
/// when it equals `[image] publish_literal` exactly.
pub fn publish_request(config: &PipelineConfig, image: &ImageArgs) -> PublishRequest {
    PublishRequest::from_arg(image.push.as_deref(), &config.image.publish_literal)
}

/// Surface environment overrides that were ignored while loading. Loading
/// happens before tracing is installed, so they are logged here instead.
pub fn log_env_warnings(config: &PipelineConfig) {
    for warning in config.env_warnings() {
        tracing::warn!(env_key = %warning.env_key, "{warning}");
    }
}

/// One finished component invocation.
#[derive(Debug)]
pub struct ComponentRun {
    pub run: PipelineRun,
    pub artifact: Option<ImageArtifact>,
    pub error: Option<CliError>,
}

impl ComponentRun {
    fn new(run: PipelineRun, result: Result<Option<ImageArtifact>, CliError>) -> Self {
        match result {
            Ok(artifact) => Self {
                run,
                artifact,
                error: None,
            },
            Err(error) => Self {
                run,
                artifact: None,
                error: Some(error),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn exit_code(&self) -> i32 {
        self.error.as_ref().map_or(0, CliError::exit_code)
    }

    pub fn report(&self) -> RunReport {
        RunReport::from_run(&self.run, self.error.as_ref(), self.artifact.clone())
    }
}

pub async fn run_setup<R: CommandRunner>(
    config: &PipelineConfig,
    runner: &R,
    reporter: &mut dyn Reporter,
) -> ComponentRun {
    let mut run = PipelineRun::new(COMPONENT_SETUP);
    let result = Installer::new(config, runner)
        .run(&mut run, reporter)
        .await
        .map(|()| None)
        .map_err(CliError::from);
    ComponentRun::new(run, result)
}

pub async fn run_tests<R: CommandRunner>(
    config: &PipelineConfig,
    runner: &R,
    reporter: &mut dyn Reporter,
) -> ComponentRun {
    let mut run = PipelineRun::new(COMPONENT_TEST);
    let result = TestOrchestrator::new(config, runner)
        .run(&mut run, reporter)
        .await
        .map(|()| None)
        .map_err(CliError::from);
    ComponentRun::new(run, result)
}

pub async fn run_build<R: CommandRunner, E: ContainerEngine>(
    config: &PipelineConfig,
    runner: &R,
    engine: &E,
    reporter: &mut dyn Reporter,
    request: PublishRequest,
) -> ComponentRun {
    let mut run = PipelineRun::new(COMPONENT_BUILD);
    let result = ImageBuilder::new(&config.image, runner, engine)
        .run(&mut run, reporter, request)
        .await
        .map(Some)
        .map_err(CliError::from);
    ComponentRun::new(run, result)
}

/// Setup, then tests, then the image build. Stops after the first component
/// that fails; the returned list holds only the components that ran.
pub async fn run_pipeline<R: CommandRunner, E: ContainerEngine>(
    config: &PipelineConfig,
    runner: &R,
    engine: &E,
    reporter: &mut dyn Reporter,
    request: PublishRequest,
) -> Vec<ComponentRun> {
    let mut finished = Vec::with_capacity(3);

    let setup = run_setup(config, runner, reporter).await;
    let ok = setup.is_success();
    finished.push(setup);
    if !ok {
        return finished;
    }

    let tests = run_tests(config, runner, reporter).await;
    let ok = tests.is_success();
    finished.push(tests);
    if !ok {
        return finished;
    }

    finished.push(run_build(config, runner, engine, reporter, request).await);
    finished
}

/// Summary payload for a chained run.
pub fn pipeline_report(runs: &[ComponentRun]) -> PipelineReport {
    let not_run = [COMPONENT_SETUP, COMPONENT_TEST, COMPONENT_BUILD]
        .iter()
        .skip(runs.len())
        .map(|name| (*name).to_owned())
        .collect();
    PipelineReport::new(runs.iter().map(ComponentRun::report).collect(), not_run)
}

/// Convert a process exit status into [`ExitCode`]. Codes outside `0..=255`
/// collapse to 1.
pub fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

/// Entry point of every binary.
pub async fn run_binary(component: Component, common: CommonArgs, image: ImageArgs) -> ExitCode {
    let config = match load_config(&common, &image).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {e}", "[ERROR]".red().bold());
            return exit_code(e.exit_code());
        }
    };

    if let Err(e) = init_tracing(&config.general) {
        eprintln!("{} {e:#}", "[ERROR]".red().bold());
        return exit_code(1);
    }
    log_env_warnings(&config);
    describe_metrics();
    tracing::info!(
        ?component,
        work_dir = %config.general.work_dir.display(),
        "configuration loaded"
    );

    let runner = SystemRunner::new(&config.general.work_dir);
    // JSON summaries own stdout; progress lines move to stderr.
    let mut reporter: Box<dyn Reporter> = match common.output {
        OutputFormat::Text => Box::new(ConsoleReporter::stdout()),
        OutputFormat::Json => Box::new(ConsoleReporter::stderr()),
    };
    let writer = OutputWriter::new(common.output);

    let (code, rendered) = match component {
        Component::Setup => {
            let run = run_setup(&config, &runner, reporter.as_mut()).await;
            (run.exit_code(), writer.render(&run.report()))
        }
        Component::Test => {
            let run = run_tests(&config, &runner, reporter.as_mut()).await;
            (run.exit_code(), writer.render(&run.report()))
        }
        Component::Build => {
            let engine = detect_engine(&config, &runner).await;
            let request = publish_request(&config, &image);
            let run = run_build(&config, &runner, &engine, reporter.as_mut(), request).await;
            (run.exit_code(), writer.render(&run.report()))
        }
        Component::Pipeline => {
            let engine = detect_engine(&config, &runner).await;
            let request = publish_request(&config, &image);
            let runs = run_pipeline(&config, &runner, &engine, reporter.as_mut(), request).await;
            let report = pipeline_report(&runs);
            (report.exit_code, writer.render(&report))
        }
    };

    if let Err(e) = rendered {
        tracing::error!(error = %e, "failed to write summary");
    }
    tracing::info!(?component, exit_code = code, "finished");
    exit_code(code)
}

async fn detect_engine(config: &PipelineConfig, runner: &SystemRunner) -> DockerEngine {
    DockerEngine::detect(runner, &config.image.engine_binary).await
}
