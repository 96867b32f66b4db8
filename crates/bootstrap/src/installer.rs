//! Environment provisioning sequence.
//!
//! ```text
//! report runtime version ─> report prerequisites        (never gate)
//!            │
//!            ▼
//! system packages? ─> venv ─> pip upgrade ─> project[dev] ─> build helpers
//!            │
//!            ▼
//! embedding model ─> runtime install? ─> LLM pull ─> verify
//! ```
//!
//! Every stage in the middle block is fatal on failure. Stages marked `?`
//! are skipped when their precondition does not hold.

use minerva_core::command::{CommandRunner, CommandSpec};
use minerva_core::config::PipelineConfig;
use minerva_core::error::StageError;
use minerva_core::report::{NoteLevel, Reporter};
use minerva_core::run::PipelineRun;
use minerva_core::stage::{Stage, StagePlan};

use crate::package::{PackageManager, detect_package_manager};
use crate::runtime::{InferenceRuntime, detect_runtime};

pub const STAGE_SYSTEM_PACKAGES: &str = "system packages";
pub const STAGE_VENV: &str = "virtual environment";
pub const STAGE_PIP_UPGRADE: &str = "pip upgrade";
pub const STAGE_PROJECT: &str = "project install";
pub const STAGE_BUILD_HELPERS: &str = "build helpers";
pub const STAGE_EMBEDDING: &str = "embedding model";
pub const STAGE_RUNTIME_INSTALL: &str = "runtime install";
pub const STAGE_LLM_PULL: &str = "llm weights";
pub const STAGE_VERIFY: &str = "verify";

/// Provisions the local environment.
pub struct Installer<'a, R> {
    config: &'a PipelineConfig,
    runner: &'a R,
}

impl<'a, R: CommandRunner> Installer<'a, R> {
    pub fn new(config: &'a PipelineConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    /// Run the whole bootstrap, stopping at the first failing stage.
    ///
    /// # Errors
    ///
    /// The first stage failure, or `PrerequisiteMissing` when verification
    /// finds the environment or the inference runtime absent. Nothing that
    /// already ran is undone.
    pub async fn run(
        &self,
        run: &mut PipelineRun,
        reporter: &mut dyn Reporter,
    ) -> Result<(), StageError> {
        reporter.section("Minerva Environment Setup");

        self.report_runtime_version(reporter).await;
        self.report_prerequisites(reporter).await;

        let manager = detect_package_manager(self.runner).await;
        let runtime = detect_runtime(self.runner, &self.config.bootstrap).await;
        let plan = self.plan(manager.as_ref(), runtime.as_ref());
        tracing::info!(stages = ?plan.names(), "bootstrap plan built");

        run.execute_plan(self.runner, reporter, plan).await?;

        if let Err(err) = self.verify(runtime.as_ref(), reporter).await {
            reporter.note(NoteLevel::Error, &err.to_string());
            run.abort(&err);
            return Err(err);
        }

        reporter.banner("Setup completed successfully!");
        for hint in self.next_steps() {
            reporter.note(NoteLevel::Info, &hint);
        }
        Ok(())
    }

    /// Ordered provisioning stages for the detected host capabilities.
    pub fn plan(&self, manager: &dyn PackageManager, runtime: &dyn InferenceRuntime) -> StagePlan {
        let boot = &self.config.bootstrap;
        let pip = self.config.resolve(boot.env_pip());
        let python = self.config.resolve(boot.env_python());
        let mut plan = StagePlan::new();

        if !manager.is_available() {
            plan.skip(STAGE_SYSTEM_PACKAGES, "no system package manager found");
        } else if let Some(cmd) = manager.install_command(boot) {
            plan.push(Stage::new(STAGE_SYSTEM_PACKAGES, cmd));
        } else {
            plan.skip(STAGE_SYSTEM_PACKAGES, "no system packages configured");
        }

        plan.push(Stage::new(
            STAGE_VENV,
            CommandSpec::new(&boot.python)
                .args(["-m", "venv"])
                .path_arg(&boot.env_dir),
        ))
        .push(Stage::new(
            STAGE_PIP_UPGRADE,
            CommandSpec::new(pip.to_string_lossy()).args(["install", "--upgrade", "pip"]),
        ))
        .push(Stage::new(
            STAGE_PROJECT,
            CommandSpec::new(pip.to_string_lossy())
                .args(["install", "-e"])
                .arg(project_spec(&boot.pip_extras)),
        ));

        if boot.extra_pip_packages.is_empty() {
            plan.skip(STAGE_BUILD_HELPERS, "no build helpers configured");
        } else {
            plan.push(Stage::new(
                STAGE_BUILD_HELPERS,
                CommandSpec::new(pip.to_string_lossy())
                    .arg("install")
                    .args(boot.extra_pip_packages.iter().cloned()),
            ));
        }

        plan.push(Stage::new(
            STAGE_EMBEDDING,
            CommandSpec::new(python.to_string_lossy())
                .arg("-c")
                .arg(embedding_fetch_script(&boot.embedding_model)),
        ));

        match runtime.install_command() {
            Some(_) if runtime.is_available() => {
                plan.skip(
                    STAGE_RUNTIME_INSTALL,
                    format!("{} already installed", runtime.binary()),
                );
            }
            Some(cmd) => {
                plan.push(Stage::new(STAGE_RUNTIME_INSTALL, cmd));
            }
            None => {
                plan.skip(STAGE_RUNTIME_INSTALL, "no inference runtime configured");
            }
        }

        match runtime.pull_command(&boot.llm_model) {
            Some(cmd) => plan.push(Stage::new(STAGE_LLM_PULL, cmd)),
            None => plan.skip(STAGE_LLM_PULL, "no inference runtime configured"),
        };

        plan
    }

    async fn report_runtime_version(&self, reporter: &mut dyn Reporter) {
        let python = &self.config.bootstrap.python;
        match self
            .runner
            .capture(&CommandSpec::new(python).arg("--version"))
            .await
        {
            Ok(out) if out.status.success() => {
                // Python 2 and early 3.x print the version on stderr.
                let text = if out.stdout.trim().is_empty() {
                    out.stderr.trim()
                } else {
                    out.stdout.trim()
                };
                tracing::info!(python = %python, version = text, "runtime version");
                reporter.note(NoteLevel::Info, &format!("Runtime: {text}"));
            }
            Ok(out) => {
                tracing::warn!(python = %python, code = ?out.status.code, "runtime version check failed");
                reporter.note(
                    NoteLevel::Warn,
                    &format!("could not determine {python} version"),
                );
            }
            Err(e) => {
                tracing::warn!(python = %python, error = %e, "runtime not found");
                reporter.note(NoteLevel::Warn, &format!("{python} not found: {e}"));
            }
        }
    }

    async fn report_prerequisites(&self, reporter: &mut dyn Reporter) {
        for tool in &self.config.bootstrap.prerequisite_tools {
            if self.runner.probe(tool).await {
                reporter.note(NoteLevel::Success, &format!("{tool} available"));
            } else {
                reporter.note(NoteLevel::Warn, &format!("{tool} not found"));
            }
        }
    }

    async fn verify(
        &self,
        runtime: &dyn InferenceRuntime,
        reporter: &mut dyn Reporter,
    ) -> Result<(), StageError> {
        let env_dir = self.config.resolve(&self.config.bootstrap.env_dir);
        if !env_dir.is_dir() {
            return Err(missing(format!(
                "virtual environment {}",
                env_dir.display()
            )));
        }
        reporter.note(NoteLevel::Success, "virtual environment present");

        let binary = runtime.binary();
        if binary.is_empty() {
            return Err(missing("inference runtime (none configured)".to_owned()));
        }
        if !self.runner.probe(binary).await {
            return Err(missing(format!("inference runtime '{binary}'")));
        }
        reporter.note(NoteLevel::Success, &format!("{binary} available"));
        Ok(())
    }

    /// Hints printed after a successful setup.
    pub fn next_steps(&self) -> Vec<String> {
        let activate = self.config.bootstrap.env_dir.join("bin").join("activate");
        vec![
            "Next steps:".to_owned(),
            format!("  1. Activate the environment: source {}", activate.display()),
            "  2. Run the test suite: minerva-test".to_owned(),
            "  3. Build the container image: minerva-build [VERSION] [push]".to_owned(),
        ]
    }
}

fn missing(what: String) -> StageError {
    StageError::PrerequisiteMissing {
        stage: STAGE_VERIFY.to_owned(),
        what,
    }
}

/// `.[dev]`, or `.` when no extras group is configured.
fn project_spec(extras: &str) -> String {
    if extras.trim().is_empty() {
        ".".to_owned()
    } else {
        format!(".[{extras}]")
    }
}

fn embedding_fetch_script(model: &str) -> String {
    format!("from sentence_transformers import SentenceTransformer; SentenceTransformer('{model}')")
}
