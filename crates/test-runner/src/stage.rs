//! Timed execution of a single test stage.

use std::time::Duration;

use minerva_core::command::{CommandRunner, CommandSpec};
use minerva_core::report::Reporter;
use minerva_core::run::timed_run;
use minerva_core::stage::{Stage, StageRecord};

/// What `run_stage` observed.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    /// Whether the command exited successfully.
    pub success: bool,
    /// Wall-clock time from spawn to exit.
    pub duration: Duration,
    pub record: StageRecord,
}

impl From<StageRecord> for StageReport {
    fn from(record: StageRecord) -> Self {
        Self {
            success: record.is_success(),
            duration: record.duration,
            record,
        }
    }
}

/// Run `command`, time it and print a pass/fail line for `name`.
///
/// A command that cannot be spawned counts as a failed stage.
pub async fn run_stage<R: CommandRunner>(
    runner: &R,
    reporter: &mut dyn Reporter,
    name: &str,
    command: CommandSpec,
) -> StageReport {
    run_stage_at(runner, reporter, 1, &Stage::new(name, command)).await
}

pub(crate) async fn run_stage_at<R: CommandRunner>(
    runner: &R,
    reporter: &mut dyn Reporter,
    ordinal: usize,
    stage: &Stage,
) -> StageReport {
    reporter.stage_started(ordinal, stage);
    let record = timed_run(runner, ordinal, stage).await;
    reporter.stage_finished(&record);
    record.into()
}
