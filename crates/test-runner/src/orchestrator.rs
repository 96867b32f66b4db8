//! Fail-fast test orchestration.

use minerva_core::command::CommandRunner;
use minerva_core::config::PipelineConfig;
use minerva_core::error::StageError;
use minerva_core::report::Reporter;
use minerva_core::run::PipelineRun;

use crate::plan::TestPlan;
use crate::stage::run_stage_at;

/// Printed only when every scheduled stage passed.
pub const SUCCESS_BANNER: &str = "All tests passed!";

/// Runs the [`TestPlan`] stage by stage.
pub struct TestOrchestrator<'a, R> {
    config: &'a PipelineConfig,
    runner: &'a R,
}

impl<'a, R: CommandRunner> TestOrchestrator<'a, R> {
    pub fn new(config: &'a PipelineConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    /// Run unit, integration, storage and (if the dataset exists) accuracy
    /// checks in that order.
    ///
    /// # Errors
    ///
    /// The first failing stage. Later stages are not started and the
    /// success banner is not printed.
    pub async fn run(
        &self,
        run: &mut PipelineRun,
        reporter: &mut dyn Reporter,
    ) -> Result<(), StageError> {
        reporter.section("Minerva Test Suite");

        let plan = TestPlan::from_config(self.config);
        tracing::info!(stages = ?plan.names(), "test plan built");

        for entry in plan.into_plan().into_entries() {
            let stage = match entry {
                Ok(stage) => stage,
                Err(skipped) => {
                    reporter.stage_skipped(&skipped.name, &skipped.reason);
                    run.skip(skipped);
                    continue;
                }
            };

            let report = run_stage_at(self.runner, reporter, run.next_ordinal(), &stage).await;
            let result = report.record.check();
            run.record(report.record);
            result?;
        }

        tracing::info!(
            total_secs = run.total_duration().as_secs_f64(),
            "test suite passed"
        );
        reporter.banner(SUCCESS_BANNER);
        Ok(())
    }
}
