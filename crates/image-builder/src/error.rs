//! 이미지 빌더 에러 타입
//!
//! 빌드의 실패 지점마다 고유한 variant가 있어 진단 메시지가 서로 다릅니다.
//! [`ImageError::exit_code`]는 명령 실패 시 자식의 종료 코드를 유지합니다.

use minerva_core::error::{ConfigError, EXIT_CONFIG, EXIT_PREREQUISITE, MinervaError, StageError};

use crate::builder::{STAGE_BUILD, STAGE_LIST, STAGE_PREFLIGHT, STAGE_PUBLISH, STAGE_SMOKE};

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// 사전 점검에서 컨테이너 엔진을 찾지 못함
    #[error("container engine '{engine}' is not installed; install it before building")]
    EngineMissing { engine: String },

    /// 요청한 버전이 사용할 수 없는 이미지 태그
    #[error("invalid image tag '{tag}': {reason}")]
    InvalidTag { tag: String, reason: String },

    /// `docker build` 실패
    #[error("image build failed for {image} ({})", describe(.exit_code))]
    BuildFailed {
        image: String,
        exit_code: Option<i32>,
    },

    /// 일회용 컨테이너가 import 검사를 통과하지 못함
    #[error("smoke test failed for {image} ({}); nothing was published", describe(.exit_code))]
    SmokeTestFailed {
        image: String,
        exit_code: Option<i32>,
    },

    /// 하나 이상의 태그 푸시 실패
    #[error("publish failed: could not push {tag} ({})", describe(.exit_code))]
    PublishFailed {
        tag: String,
        exit_code: Option<i32>,
    },

    /// 스모크 테스트 통과나 동의 없이 게시 시도
    #[error("publish not allowed: {0}")]
    PublishNotAllowed(String),

    /// Docker API 호출 실패
    #[error("docker api error: {0}")]
    DockerApi(String),

    /// 스테이지 명령을 시작할 수 없음
    #[error("{0}")]
    Stage(StageError),
}

impl ImageError {
    /// 에러를 프로세스 종료 코드로 변환
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EngineMissing { .. } => EXIT_PREREQUISITE,
            Self::InvalidTag { .. } => EXIT_CONFIG,
            Self::BuildFailed { exit_code, .. }
            | Self::SmokeTestFailed { exit_code, .. }
            | Self::PublishFailed { exit_code, .. } => match exit_code {
                Some(code) if *code != 0 => *code,
                _ => 1,
            },
            Self::PublishNotAllowed(_) | Self::DockerApi(_) => 1,
            Self::Stage(e) => e.exit_code(),
        }
    }

    /// 실패한 스테이지 분류: 명령 실패는 `on_failure`로, 나머지는 그대로
    pub(crate) fn from_stage(
        err: StageError,
        on_failure: impl FnOnce(Option<i32>) -> ImageError,
    ) -> Self {
        match err {
            StageError::SubprocessFailure { exit_code, .. } => on_failure(exit_code),
            other => Self::Stage(other),
        }
    }
}

impl From<ImageError> for MinervaError {
    fn from(err: ImageError) -> Self {
        let stage_error = match &err {
            ImageError::EngineMissing { engine } => StageError::PrerequisiteMissing {
                stage: STAGE_PREFLIGHT.to_owned(),
                what: format!("container engine '{engine}'"),
            },
            ImageError::InvalidTag { tag, reason } => {
                return MinervaError::Config(ConfigError::InvalidValue {
                    field: "image.version".to_owned(),
                    reason: format!("'{tag}': {reason}"),
                });
            }
            ImageError::BuildFailed { exit_code, .. } => StageError::SubprocessFailure {
                stage: STAGE_BUILD.to_owned(),
                exit_code: *exit_code,
            },
            ImageError::SmokeTestFailed { exit_code, .. } => StageError::SubprocessFailure {
                stage: STAGE_SMOKE.to_owned(),
                exit_code: *exit_code,
            },
            ImageError::PublishFailed { exit_code, .. } => StageError::SubprocessFailure {
                stage: STAGE_PUBLISH.to_owned(),
                exit_code: *exit_code,
            },
            ImageError::PublishNotAllowed(reason) => StageError::PrerequisiteMissing {
                stage: STAGE_PUBLISH.to_owned(),
                what: reason.clone(),
            },
            ImageError::DockerApi(reason) => StageError::PrerequisiteMissing {
                stage: STAGE_LIST.to_owned(),
                what: reason.clone(),
            },
            ImageError::Stage(e) => e.clone(),
        };
        MinervaError::Stage(stage_error)
    }
}

fn describe(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_owned(),
    }
}
