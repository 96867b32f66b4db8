//! 스테이지 모델 -- 무엇이, 어떤 순서로 실행되고, 어떻게 끝났는지

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::command::{CommandSpec, CommandStatus};
use crate::error::StageError;

/// 외부 명령으로 수행되는 작업 단위
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub command: CommandSpec,
}

impl Stage {
    pub fn new(name: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            name: name.into(),
            command,
        }
    }
}

/// 선택적 스테이지의 선행 조건
///
/// 계획을 만들 때 평가됩니다. 조건이 충족되지 않으면 스테이지가 계획에서
/// 빠지며 실패로 간주되지 않습니다.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// 계획 시점에 파일이 존재하면 충족
    FileExists(PathBuf),
    /// 미리 평가된 조건 (예: probe 결과)과 불충족 시 보고할 사유
    Holds { met: bool, reason: String },
}

impl Condition {
    pub fn holds(met: bool, reason: impl Into<String>) -> Self {
        Self::Holds {
            met,
            reason: reason.into(),
        }
    }

    pub fn is_met(&self) -> bool {
        match self {
            Self::FileExists(path) => path.is_file(),
            Self::Holds { met, .. } => *met,
        }
    }

    /// 스테이지를 건너뛴 사유
    pub fn skip_reason(&self) -> String {
        match self {
            Self::FileExists(path) => format!("{} not found", path.display()),
            Self::Holds { reason, .. } => reason.clone(),
        }
    }
}

/// 조건 미충족으로 run에서 빠진 스테이지
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStage {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
enum PlanEntry {
    Run(Stage),
    Skip(SkippedStage),
}

/// 조건부 항목이 이미 해석된 순서 있는 스테이지 목록
#[derive(Debug, Clone, Default)]
pub struct StagePlan {
    entries: Vec<PlanEntry>,
}

impl StagePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// 무조건 스테이지 추가
    pub fn push(&mut self, stage: Stage) -> &mut Self {
        self.entries.push(PlanEntry::Run(stage));
        self
    }

    /// `condition`이 지금 충족될 때만 `stage` 추가
    pub fn push_if(&mut self, condition: &Condition, stage: Stage) -> &mut Self {
        if condition.is_met() {
            self.entries.push(PlanEntry::Run(stage));
        } else {
            self.entries.push(PlanEntry::Skip(SkippedStage {
                name: stage.name,
                reason: condition.skip_reason(),
            }));
        }
        self
    }

    /// 명령을 만들지 않고 실행 불가 스테이지 기록
    pub fn skip(&mut self, name: impl Into<String>, reason: impl Into<String>) -> &mut Self {
        self.entries.push(PlanEntry::Skip(SkippedStage {
            name: name.into(),
            reason: reason.into(),
        }));
        self
    }

    /// 실행될 스테이지 (순서대로)
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.entries.iter().filter_map(|e| match e {
            PlanEntry::Run(stage) => Some(stage),
            PlanEntry::Skip(_) => None,
        })
    }

    /// 조건으로 제외된 스테이지
    pub fn skipped(&self) -> impl Iterator<Item = &SkippedStage> {
        self.entries.iter().filter_map(|e| match e {
            PlanEntry::Skip(skipped) => Some(skipped),
            PlanEntry::Run(_) => None,
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 계획 순서의 항목들. 건너뛴 항목은 `Err`
    pub fn into_entries(self) -> impl Iterator<Item = Result<Stage, SkippedStage>> {
        self.entries.into_iter().map(|e| match e {
            PlanEntry::Run(stage) => Ok(stage),
            PlanEntry::Skip(skipped) => Err(skipped),
        })
    }
}

/// 스테이지 종료 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Success,
    Failure {
        exit_code: Option<i32>,
        /// 명령을 시작하지 못했을 때 설정
        #[serde(skip_serializing_if = "Option::is_none")]
        spawn_error: Option<String>,
    },
}

/// 실행된 스테이지 하나의 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    /// run 내 1부터 시작하는 위치
    pub ordinal: usize,
    pub name: String,
    pub command: String,
    #[serde(skip)]
    pub program: String,
    pub outcome: StageOutcome,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
}

impl StageRecord {
    /// 끝까지 실행된 명령의 기록
    pub fn finished(ordinal: usize, stage: &Stage, status: CommandStatus, duration: Duration) -> Self {
        let outcome = if status.success() {
            StageOutcome::Success
        } else {
            StageOutcome::Failure {
                exit_code: status.code,
                spawn_error: None,
            }
        };
        Self {
            ordinal,
            name: stage.name.clone(),
            command: stage.command.to_string(),
            program: stage.command.program.clone(),
            outcome,
            duration,
        }
    }

    /// 시작하지 못한 명령의 기록
    pub fn spawn_failed(
        ordinal: usize,
        stage: &Stage,
        error: &std::io::Error,
        duration: Duration,
    ) -> Self {
        Self {
            ordinal,
            name: stage.name.clone(),
            command: stage.command.to_string(),
            program: stage.command.program.clone(),
            outcome: StageOutcome::Failure {
                exit_code: None,
                spawn_error: Some(error.to_string()),
            },
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StageOutcome::Success)
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    /// 실패 기록을 파이프라인을 중단시키는 에러로 변환
    pub fn check(&self) -> Result<(), StageError> {
        match &self.outcome {
            StageOutcome::Success => Ok(()),
            StageOutcome::Failure {
                spawn_error: Some(reason),
                ..
            } => Err(StageError::Spawn {
                stage: self.name.clone(),
                program: self.program.clone(),
                reason: reason.clone(),
            }),
            StageOutcome::Failure { exit_code, .. } => Err(StageError::SubprocessFailure {
                stage: self.name.clone(),
                exit_code: *exit_code,
            }),
        }
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str) -> Stage {
        Stage::new(name, CommandSpec::new("true"))
    }

    #[test]
    fn plan_keeps_insertion_order() {
        let mut plan = StagePlan::new();
        plan.push(stage("unit tests"))
            .push(stage("integration tests"))
            .push(stage("storage check"));
        assert_eq!(
            plan.names(),
            vec!["unit tests", "integration tests", "storage check"]
        );
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn unmet_condition_excludes_stage() {
        let mut plan = StagePlan::new();
        plan.push(stage("unit tests"));
        plan.push_if(&Condition::holds(false, "dataset missing"), stage("accuracy"));
        assert_eq!(plan.names(), vec!["unit tests"]);
        let skipped: Vec<_> = plan.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].name, "accuracy");
        assert_eq!(skipped[0].reason, "dataset missing");
    }

    #[test]
    fn explicit_skip_keeps_position() {
        let mut plan = StagePlan::new();
        plan.push(stage("venv"))
            .skip("system packages", "no package manager")
            .push(stage("pip"));
        let order: Vec<_> = plan
            .into_entries()
            .map(|e| match e {
                Ok(stage) => stage.name,
                Err(skipped) => format!("skip:{}", skipped.name),
            })
            .collect();
        assert_eq!(order, vec!["venv", "skip:system packages", "pip"]);
    }

    #[test]
    fn file_exists_condition_tracks_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_set.json");
        let condition = Condition::FileExists(path.clone());
        assert!(!condition.is_met());
        assert!(condition.skip_reason().contains("test_set.json"));

        std::fs::write(&path, "[]").unwrap();
        assert!(condition.is_met());
    }

    #[test]
    fn file_exists_condition_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!Condition::FileExists(dir.path().to_path_buf()).is_met());
    }

    #[test]
    fn finished_record_mirrors_exit_status() {
        let ok = StageRecord::finished(1, &stage("a"), CommandStatus::SUCCESS, Duration::ZERO);
        assert!(ok.is_success());
        assert!(ok.check().is_ok());

        let failed = StageRecord::finished(
            2,
            &stage("b"),
            CommandStatus::from_code(4),
            Duration::from_millis(1500),
        );
        assert!(!failed.is_success());
        assert_eq!(failed.duration_secs(), 1.5);
        match failed.check() {
            Err(StageError::SubprocessFailure { stage, exit_code }) => {
                assert_eq!(stage, "b");
                assert_eq!(exit_code, Some(4));
            }
            other => panic!("expected subprocess failure, got {other:?}"),
        }
    }

    #[test]
    fn spawn_failed_record_checks_as_spawn_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file");
        let record = StageRecord::spawn_failed(1, &stage("venv"), &err, Duration::ZERO);
        assert!(matches!(record.check(), Err(StageError::Spawn { .. })));
    }

    #[test]
    fn record_serializes_duration_in_seconds() {
        let record = StageRecord::finished(
            1,
            &stage("unit tests"),
            CommandStatus::SUCCESS,
            Duration::from_millis(250),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["duration_secs"], 0.25);
        assert_eq!(json["outcome"]["status"], "success");
        assert!(json.get("program").is_none());
    }
}
