//! Run summaries rendered as text or JSON.
//!
//! Stage lines are printed live by the reporter; the payloads here are the
//! closing summary written once a component (or the whole pipeline) ends.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use minerva_core::run::{PipelineRun, RunOutcome};
use minerva_core::stage::{SkippedStage, StageRecord};
use minerva_image_builder::ImageArtifact;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes summaries to stdout in the selected format.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    /// Render a payload to any writer.
    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => payload.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable rendering, implemented next to `serde::Serialize` by
/// every summary payload.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// Summary of one component invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub component: String,
    pub run_id: String,
    pub outcome: RunOutcome,
    pub stages: Vec<StageRecord>,
    pub skipped: Vec<SkippedStage>,
    pub total_duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ImageArtifact>,
}

impl RunReport {
    /// Summarise `run`. `failure` overrides the run's own view of success,
    /// since some errors (an invalid tag, say) never reach a stage.
    pub fn from_run(
        run: &PipelineRun,
        failure: Option<&CliError>,
        artifact: Option<ImageArtifact>,
    ) -> Self {
        let outcome = if failure.is_some() {
            RunOutcome::Failed
        } else {
            run.outcome()
        };
        Self {
            component: run.component().to_owned(),
            run_id: run.id().to_string(),
            outcome,
            stages: run.stages().to_vec(),
            skipped: run.skipped().to_vec(),
            total_duration_secs: run.total_duration().as_secs_f64(),
            error: failure.map(ToString::to_string),
            exit_code: failure.map_or(0, CliError::exit_code),
            artifact,
        }
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w)?;
        writeln!(w, "{} {}", "Summary:".bold(), self.component)?;
        for stage in &self.stages {
            let mark = if stage.is_success() {
                "✓".green()
            } else {
                "✗".red()
            };
            writeln!(
                w,
                "  {mark} {:<24} {:>8.2}s",
                stage.name,
                stage.duration_secs()
            )?;
        }
        for skipped in &self.skipped {
            writeln!(
                w,
                "  {} {:<24} {}",
                "-".yellow(),
                skipped.name,
                format!("skipped ({})", skipped.reason).yellow()
            )?;
        }
        writeln!(w, "  Total: {:.2}s", self.total_duration_secs)?;

        if let Some(artifact) = &self.artifact {
            writeln!(
                w,
                "  Image: {} [build: {:?}, smoke: {:?}, publish: {:?}]",
                artifact.tags().join(", "),
                artifact.build_status,
                artifact.smoke_status,
                artifact.publish_status
            )?;
        }

        match &self.error {
            None => writeln!(w, "  Result: {}", "succeeded".green())?,
            Some(error) => writeln!(
                w,
                "  Result: {} {error} (exit code {})",
                "FAILED".red().bold(),
                self.exit_code
            )?,
        }
        Ok(())
    }
}

/// Summary of a chained setup → test → build invocation.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub outcome: RunOutcome,
    pub components: Vec<RunReport>,
    /// Components never started because an earlier one failed.
    pub not_run: Vec<String>,
    pub exit_code: i32,
}

impl PipelineReport {
    pub fn new(components: Vec<RunReport>, not_run: Vec<String>) -> Self {
        let failed = components
            .iter()
            .find(|c| c.outcome == RunOutcome::Failed);
        Self {
            outcome: if failed.is_some() {
                RunOutcome::Failed
            } else {
                RunOutcome::Succeeded
            },
            exit_code: failed.map_or(0, |c| c.exit_code),
            components,
            not_run,
        }
    }
}

impl Render for PipelineReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for component in &self.components {
            component.render_text(w)?;
        }
        for name in &self.not_run {
            writeln!(w, "  {} {name} not run", "-".yellow())?;
        }
        writeln!(w)?;
        match self.outcome {
            RunOutcome::Succeeded => writeln!(w, "{}", "Pipeline succeeded".green().bold()),
            RunOutcome::Failed => writeln!(
                w,
                "{} (exit code {})",
                "Pipeline failed".red().bold(),
                self.exit_code
            ),
        }
    }
}
