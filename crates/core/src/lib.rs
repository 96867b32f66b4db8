//! Minerva 파이프라인 공통 구성 요소 -- 환경 구성, 테스트, 이미지 빌드가 공유
//!
//! # Module Structure
//!
//! - [`config`]: `PipelineConfig`, 한 번 로드 후 참조로 전달
//! - [`error`]: `MinervaError`, `ConfigError`, `StageError` 및 종료 코드
//! - [`command`]: 외부 프로세스용 `CommandRunner` trait
//! - [`stage`]: `Stage`, `Condition`, `StagePlan`, `StageRecord`
//! - [`run`]: `PipelineRun`, 순차적 fail-fast 실행기
//! - [`report`]: 진행 상황 출력용 `Reporter` trait
//! - [`metrics`]: 메트릭 이름
//!
//! # Flow
//!
//! ```text
//! PipelineConfig ──> component builds StagePlan (conditions resolved)
//!                          │
//!                    PipelineRun::execute_plan
//!                          │  first Err stops the loop
//!                          ▼
//!                    StageError ──> exit code
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod run;
pub mod stage;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// --- Public API Re-exports ---

pub use command::{CommandOutput, CommandRunner, CommandSpec, CommandStatus, SystemRunner};
pub use config::PipelineConfig;
pub use error::{ConfigError, MinervaError, StageError};
pub use report::{NoteLevel, NullReporter, Reporter};
pub use run::{PipelineRun, RunOutcome, timed_run};
pub use stage::{Condition, SkippedStage, Stage, StageOutcome, StagePlan, StageRecord};
