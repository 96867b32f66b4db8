//! 에러 타입 -- 파이프라인 컴포넌트 공통 에러 정의
//!
//! [`MinervaError`]가 최상위 에러입니다. 각 컴포넌트 크레이트는 자체 에러 enum을
//! 정의하고 이 타입으로 변환하여 크레이트 경계를 넘어 `?`로 전파합니다.

/// 필수 도구나 파일이 없을 때의 종료 코드
pub const EXIT_PREREQUISITE: i32 = 1;

/// 설정 에러 종료 코드
pub const EXIT_CONFIG: i32 = 2;

/// 명령을 아예 시작하지 못했을 때의 종료 코드
pub const EXIT_SPAWN: i32 = 127;

/// Minerva 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum MinervaError {
    /// 설정 로딩 또는 검증 실패
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 스테이지 실패 (실행은 여기서 중단)
    #[error("{0}")]
    Stage(#[from] StageError),

    /// 스테이지 밖의 I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MinervaError {
    /// 에러를 프로세스 종료 코드로 변환
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => EXIT_CONFIG,
            Self::Stage(e) => e.exit_code(),
            Self::Io(_) => 1,
        }
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 명시적으로 지정된 설정 파일이 존재하지 않음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// TOML 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 사용할 수 없는 필드 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스테이지 수준 실패
///
/// 모든 variant는 치명적이며 처음 발생한 것이 파이프라인을 종료합니다.
/// 조건 미충족으로 건너뛴 스테이지는 에러가 아니므로 여기에 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    /// 필요한 외부 도구나 산출물이 없음
    #[error("[{stage}] prerequisite missing: {what}")]
    PrerequisiteMissing { stage: String, what: String },

    /// 스테이지 명령이 실행되었으나 실패를 보고함
    #[error("[{stage}] command failed ({})", describe_code(.exit_code))]
    SubprocessFailure {
        stage: String,
        exit_code: Option<i32>,
    },

    /// 스테이지 명령을 시작할 수 없음
    #[error("[{stage}] failed to start '{program}': {reason}")]
    Spawn {
        stage: String,
        program: String,
        reason: String,
    },
}

impl StageError {
    /// 에러를 낸 스테이지 이름
    pub fn stage(&self) -> &str {
        match self {
            Self::PrerequisiteMissing { stage, .. }
            | Self::SubprocessFailure { stage, .. }
            | Self::Spawn { stage, .. } => stage,
        }
    }

    /// 이 실패에 해당하는 프로세스 종료 코드
    ///
    /// 하위 프로세스 실패는 자식의 종료 코드를 그대로 사용합니다.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PrerequisiteMissing { .. } => EXIT_PREREQUISITE,
            Self::SubprocessFailure { exit_code, .. } => match exit_code {
                Some(code) if *code != 0 => *code,
                _ => 1,
            },
            Self::Spawn { .. } => EXIT_SPAWN,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subprocess_failure_reuses_child_exit_code() {
        let err = StageError::SubprocessFailure {
            stage: "unit tests".to_owned(),
            exit_code: Some(5),
        };
        assert_eq!(err.exit_code(), 5);
        assert_eq!(err.stage(), "unit tests");
    }

    #[test]
    fn signal_terminated_subprocess_maps_to_one() {
        let err = StageError::SubprocessFailure {
            stage: "build".to_owned(),
            exit_code: None,
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn prerequisite_missing_exit_code() {
        let err = StageError::PrerequisiteMissing {
            stage: "pre-flight".to_owned(),
            what: "docker".to_owned(),
        };
        assert_eq!(err.exit_code(), EXIT_PREREQUISITE);
        assert_eq!(
            err.to_string(),
            "[pre-flight] prerequisite missing: docker"
        );
    }

    #[test]
    fn spawn_error_exit_code() {
        let err = StageError::Spawn {
            stage: "venv".to_owned(),
            program: "python3".to_owned(),
            reason: "not found".to_owned(),
        };
        assert_eq!(err.exit_code(), EXIT_SPAWN);
    }

    #[test]
    fn config_error_maps_to_exit_two() {
        let err: MinervaError = ConfigError::ParseFailed {
            reason: "bad".to_owned(),
        }
        .into();
        assert_eq!(err.exit_code(), EXIT_CONFIG);
    }

    #[test]
    fn stage_error_display_passes_through() {
        let err: MinervaError = StageError::SubprocessFailure {
            stage: "storage check".to_owned(),
            exit_code: Some(1),
        }
        .into();
        assert_eq!(err.to_string(), "[storage check] command failed (exit code 1)");
    }
}
