//! Terminal rendering of stage progress.

use std::io::Write;

use colored::Colorize;

use minerva_core::report::{NoteLevel, Reporter};
use minerva_core::stage::{Stage, StageOutcome, StageRecord};

/// Writes colored progress lines as stages start and finish.
///
/// Write failures are dropped: losing a progress line must not change the
/// outcome of the run.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl ConsoleReporter<std::io::Stderr> {
    /// Used when stdout is reserved for JSON output.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn section(&mut self, title: &str) {
        let _ = writeln!(self.out, "\n{}", format!("=== {title} ===").bold());
    }

    fn stage_started(&mut self, ordinal: usize, stage: &Stage) {
        let _ = writeln!(
            self.out,
            "{} {}",
            format!("[{ordinal}]").blue(),
            format!("Running {}...", stage.name).blue()
        );
    }

    fn stage_finished(&mut self, record: &StageRecord) {
        let line = match &record.outcome {
            StageOutcome::Success => format!(
                "✓ {} passed ({:.2}s)",
                record.name,
                record.duration_secs()
            )
            .green(),
            StageOutcome::Failure {
                spawn_error: Some(reason),
                ..
            } => format!("✗ {} could not start: {reason}", record.name).red(),
            StageOutcome::Failure {
                exit_code: Some(code),
                ..
            } => format!(
                "✗ {} failed with exit code {code} ({:.2}s)",
                record.name,
                record.duration_secs()
            )
            .red(),
            StageOutcome::Failure { .. } => format!(
                "✗ {} was terminated ({:.2}s)",
                record.name,
                record.duration_secs()
            )
            .red(),
        };
        let _ = writeln!(self.out, "{line}");
    }

    fn stage_skipped(&mut self, name: &str, reason: &str) {
        let _ = writeln!(
            self.out,
            "{}",
            format!("- {name} skipped: {reason}").yellow()
        );
    }

    fn note(&mut self, level: NoteLevel, message: &str) {
        let _ = match level {
            NoteLevel::Info => writeln!(self.out, "  {message}"),
            NoteLevel::Success => writeln!(self.out, "✅ {message}"),
            NoteLevel::Warn => writeln!(self.out, "{}", format!("⚠️  {message}").yellow()),
            NoteLevel::Error => writeln!(self.out, "{} {message}", "[ERROR]".red().bold()),
        };
    }

    fn banner(&mut self, message: &str) {
        let _ = writeln!(self.out, "\n{}", format!("🎉 {message}").green().bold());
    }
}
