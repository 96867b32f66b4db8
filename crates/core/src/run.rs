//! 순차적 fail-fast 스테이지 실행
//!
//! [`PipelineRun`]은 컴포넌트 호출 한 번의 순서 있는 기록을 소유합니다.
//! 스테이지는 엄격히 하나씩 await 됩니다. 첫 실패는 run에 저장되어 호출자에게
//! 반환되며, 그 뒤로는 어떤 실행이나 기록도 거부합니다.

use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use uuid::Uuid;

use crate::command::CommandRunner;
use crate::error::StageError;
use crate::metrics as names;
use crate::report::Reporter;
use crate::stage::{SkippedStage, Stage, StagePlan, StageRecord};

/// run의 전체 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

/// 컴포넌트 호출 한 번에서 실행된 스테이지들
#[derive(Debug, Clone)]
pub struct PipelineRun {
    id: Uuid,
    component: String,
    stages: Vec<StageRecord>,
    skipped: Vec<SkippedStage>,
    error: Option<StageError>,
}

impl PipelineRun {
    pub fn new(component: impl Into<String>) -> Self {
        let component = component.into();
        let id = Uuid::new_v4();
        tracing::info!(run_id = %id, component = %component, "pipeline run started");
        Self {
            id,
            component,
            stages: Vec::new(),
            skipped: Vec::new(),
            error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    pub fn skipped(&self) -> &[SkippedStage] {
        &self.skipped
    }

    /// run을 끝낸 실패 (있다면)
    pub fn error(&self) -> Option<&StageError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.is_success() {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Failed
        }
    }

    /// 기록된 스테이지 소요 시간의 합
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// 다음에 기록될 스테이지의 순번
    pub fn next_ordinal(&self) -> usize {
        self.stages.len() + 1
    }

    /// 스테이지 기록 추가
    ///
    /// run이 이미 실패했다면 기록을 버리고 `false`를 반환합니다.
    pub fn record(&mut self, record: StageRecord) -> bool {
        if let Some(err) = &self.error {
            tracing::warn!(
                stage = %record.name,
                failed_stage = err.stage(),
                "run already failed, dropping stage record"
            );
            return false;
        }

        let result = if record.is_success() { "success" } else { "failure" };
        counter!(
            names::STAGE_TOTAL,
            names::LABEL_COMPONENT => self.component.clone(),
            names::LABEL_STAGE => record.name.clone(),
            names::LABEL_RESULT => result
        )
        .increment(1);
        histogram!(
            names::STAGE_DURATION_SECONDS,
            names::LABEL_COMPONENT => self.component.clone(),
            names::LABEL_STAGE => record.name.clone()
        )
        .record(record.duration_secs());

        if let Err(err) = record.check() {
            counter!(
                names::STAGE_FAILURES_TOTAL,
                names::LABEL_COMPONENT => self.component.clone(),
                names::LABEL_STAGE => record.name.clone()
            )
            .increment(1);
            self.error = Some(err);
        }
        self.stages.push(record);
        true
    }

    /// 조건 미충족으로 빠진 스테이지 기록
    pub fn skip(&mut self, skipped: SkippedStage) {
        counter!(
            names::STAGE_SKIPPED_TOTAL,
            names::LABEL_COMPONENT => self.component.clone(),
            names::LABEL_STAGE => skipped.name.clone()
        )
        .increment(1);
        tracing::info!(stage = %skipped.name, reason = %skipped.reason, "stage skipped");
        self.skipped.push(skipped);
    }

    /// 선행 조건 누락처럼 스테이지 명령 외의 이유로 run을 실패 처리.
    /// 첫 실패가 우선합니다.
    pub fn abort(&mut self, err: &StageError) {
        if self.error.is_none() {
            tracing::error!(stage = err.stage(), error = %err, "pipeline aborted");
            self.error = Some(err.clone());
        }
    }

    /// 스테이지 하나를 실행하고 기록
    ///
    /// # Errors
    ///
    /// 스테이지 실패를 반환합니다. run이 이미 실패했다면 아무것도 실행하지
    /// 않고 이전 실패를 반환합니다.
    pub async fn execute<R: CommandRunner>(
        &mut self,
        runner: &R,
        reporter: &mut dyn Reporter,
        stage: &Stage,
    ) -> Result<(), StageError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        let ordinal = self.next_ordinal();
        reporter.stage_started(ordinal, stage);
        let record = timed_run(runner, ordinal, stage).await;
        reporter.stage_finished(&record);
        let result = record.check();
        self.record(record);
        result
    }

    /// `plan`의 모든 스테이지를 순서대로 실행하고 첫 실패에서 멈춤
    ///
    /// 건너뛴 항목은 계획 내 위치에서 보고됩니다.
    pub async fn execute_plan<R: CommandRunner>(
        &mut self,
        runner: &R,
        reporter: &mut dyn Reporter,
        plan: StagePlan,
    ) -> Result<(), StageError> {
        for entry in plan.into_entries() {
            match entry {
                Ok(stage) => self.execute(runner, reporter, &stage).await?,
                Err(skipped) => {
                    reporter.stage_skipped(&skipped.name, &skipped.reason);
                    self.skip(skipped);
                }
            }
        }
        Ok(())
    }
}

/// 스테이지 명령을 실행하며 실행 시간 측정
///
/// 실패하지 않습니다. 시작할 수 없는 명령은 실패 기록이 됩니다.
pub async fn timed_run<R: CommandRunner>(runner: &R, ordinal: usize, stage: &Stage) -> StageRecord {
    tracing::info!(stage = %stage.name, ordinal, command = %stage.command, "stage started");
    let started = Instant::now();
    let result = runner.run(&stage.command).await;
    let elapsed = started.elapsed();

    let record = match result {
        Ok(status) => StageRecord::finished(ordinal, stage, status, elapsed),
        Err(e) => StageRecord::spawn_failed(ordinal, stage, &e, elapsed),
    };

    if record.is_success() {
        tracing::info!(
            stage = %record.name,
            duration_ms = elapsed.as_millis() as u64,
            "stage passed"
        );
    } else {
        tracing::error!(
            stage = %record.name,
            duration_ms = elapsed.as_millis() as u64,
            outcome = ?record.outcome,
            "stage failed"
        );
    }
    record
}
