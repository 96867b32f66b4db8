//! 설정 관리 -- minerva.toml 파싱 및 환경변수 오버라이드
//!
//! [`PipelineConfig`]는 바이너리 시작 시 한 번 만들어진 뒤 고정되어
//! 모든 컴포넌트에 참조로 전달됩니다. 스테이지는 프로세스 환경을 직접 읽지 않습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (로딩 후 바이너리가 적용)
//! 2. 환경변수 (`MINERVA_TESTS_MAX_STORAGE_GB=5` 형식)
//! 3. 설정 파일 (`minerva.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! 파싱할 수 없는 환경변수 값은 무시되고 [`EnvOverrideWarning`]으로 남습니다.
//! 로깅이 초기화되기 전에 로딩되므로 호출자가 [`PipelineConfig::env_warnings`]를
//! 나중에 출력해야 합니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), minerva_core::error::MinervaError> {
//! use minerva_core::config::PipelineConfig;
//!
//! let config = PipelineConfig::load("minerva.toml").await?;
//! let config = PipelineConfig::parse("[tests]\nmax_storage_gb = 5.0")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, MinervaError};

/// 명령줄에 설정 파일이 없을 때 찾는 경로
pub const DEFAULT_CONFIG_PATH: &str = "minerva.toml";

/// 버전이 주어지지 않았을 때 사용하는 이미지 태그
pub const DEFAULT_IMAGE_VERSION: &str = "0.1.0";

/// 게시를 활성화하는 두 번째 인자 리터럴
pub const DEFAULT_PUBLISH_LITERAL: &str = "push";

/// Minerva 파이프라인 통합 설정
///
/// `minerva.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 환경 구성 설정
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// 테스트 스테이지 설정
    #[serde(default)]
    pub tests: TestsConfig,
    /// 컨테이너 이미지 설정
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(skip)]
    env_warnings: Vec<EnvOverrideWarning>,
}

/// 파싱에 실패해 무시된 환경변수 오버라이드
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverrideWarning {
    pub env_key: String,
    pub value: String,
    /// 기대한 값 형식 ("bool", "number")
    pub expected: &'static str,
}

impl std::fmt::Display for EnvOverrideWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ignoring {}='{}': expected a {}",
            self.env_key, self.value, self.expected
        )
    }
}

impl PipelineConfig {
    /// TOML 파일 로드 + 환경변수 오버라이드 + 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, MinervaError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// [`load`](Self::load)와 같지만 파일이 없으면 기본값을 사용합니다.
    ///
    /// 암묵적인 `minerva.toml` 조회에 사용합니다. 명시적으로 지정된 파일은
    /// 반드시 존재해야 합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, MinervaError> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Self::load(path).await;
        }
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 환경변수 오버라이드 없이 TOML 파일만 로드
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, MinervaError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MinervaError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                MinervaError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열 파싱
    pub fn parse(toml_str: &str) -> Result<Self, MinervaError> {
        toml::from_str(toml_str).map_err(|e| {
            MinervaError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// `MINERVA_{SECTION}_{FIELD}` 환경변수로 필드를 오버라이드합니다.
    ///
    /// 파싱에 실패한 값은 [`env_warnings`](Self::env_warnings)에 기록됩니다.
    pub fn apply_env_overrides(&mut self) {
        let mut warnings = Vec::new();

        // General
        override_string(&mut self.general.log_level, "MINERVA_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "MINERVA_GENERAL_LOG_FORMAT");
        override_path(&mut self.general.work_dir, "MINERVA_GENERAL_WORK_DIR");

        // Bootstrap
        override_string(&mut self.bootstrap.python, "MINERVA_BOOTSTRAP_PYTHON");
        override_path(&mut self.bootstrap.env_dir, "MINERVA_BOOTSTRAP_ENV_DIR");
        override_csv(
            &mut self.bootstrap.system_packages,
            "MINERVA_BOOTSTRAP_SYSTEM_PACKAGES",
        );
        override_string(
            &mut self.bootstrap.embedding_model,
            "MINERVA_BOOTSTRAP_EMBEDDING_MODEL",
        );
        override_string(&mut self.bootstrap.llm_model, "MINERVA_BOOTSTRAP_LLM_MODEL");
        override_string(
            &mut self.bootstrap.runtime_binary,
            "MINERVA_BOOTSTRAP_RUNTIME_BINARY",
        );

        // Tests
        override_f64(
            &mut self.tests.max_storage_gb,
            "MINERVA_TESTS_MAX_STORAGE_GB",
            &mut warnings,
        );
        override_path(&mut self.tests.dataset_path, "MINERVA_TESTS_DATASET_PATH");
        override_bool(
            &mut self.tests.accuracy_quick,
            "MINERVA_TESTS_ACCURACY_QUICK",
            &mut warnings,
        );

        // Image
        override_string(&mut self.image.name, "MINERVA_IMAGE_NAME");
        override_string(&mut self.image.version, "MINERVA_IMAGE_VERSION");
        override_string(&mut self.image.engine_binary, "MINERVA_IMAGE_ENGINE_BINARY");
        override_path(&mut self.image.context_dir, "MINERVA_IMAGE_CONTEXT_DIR");

        self.env_warnings = warnings;
    }

    /// 마지막 [`apply_env_overrides`](Self::apply_env_overrides)에서 무시된 값들
    pub fn env_warnings(&self) -> &[EnvOverrideWarning] {
        &self.env_warnings
    }

    /// 스테이지 깊숙한 곳에서 실패할 값을 미리 검증합니다.
    pub fn validate(&self) -> Result<(), MinervaError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.bootstrap.python.trim().is_empty() {
            return Err(invalid("bootstrap.python", "must not be empty".to_owned()));
        }

        // 런타임 없이는 환경 검증이 항상 실패하므로 설치 전에 거부
        if self.bootstrap.runtime_binary.trim().is_empty() {
            return Err(invalid(
                "bootstrap.runtime_binary",
                "must not be empty".to_owned(),
            ));
        }

        if !self.tests.max_storage_gb.is_finite() || self.tests.max_storage_gb <= 0.0 {
            return Err(invalid(
                "tests.max_storage_gb",
                format!("must be a positive number, got {}", self.tests.max_storage_gb),
            ));
        }

        if !is_valid_image_name(&self.image.name) {
            return Err(invalid(
                "image.name",
                format!(
                    "'{}' is not a valid repository name (lowercase letters, digits, '.', '_', '-', '/')",
                    self.image.name
                ),
            ));
        }

        if !is_valid_tag(&self.image.version) {
            return Err(invalid(
                "image.version",
                format!("'{}' is not a valid image tag", self.image.version),
            ));
        }

        if self.image.publish_literal.trim().is_empty() {
            return Err(invalid(
                "image.publish_literal",
                "must not be empty".to_owned(),
            ));
        }

        if self.image.smoke_command.is_empty() {
            return Err(invalid(
                "image.smoke_command",
                "must contain at least the program to run".to_owned(),
            ));
        }

        Ok(())
    }

    /// 작업 디렉터리 기준 상대 경로 해석
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.general.work_dir.join(path)
        }
    }
}

fn invalid(field: &str, reason: String) -> MinervaError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// Docker 태그 규칙: `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`
pub fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    tag.len() <= 128
        && (first.is_ascii_alphanumeric() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn is_valid_image_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(['.', '-', '_', '/'])
        && !name.ends_with(['.', '-', '_', '/'])
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-' | '/'))
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 모든 명령이 실행되는 프로젝트 디렉터리
    pub work_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            work_dir: PathBuf::from("."),
        }
    }
}

/// 환경 구성 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// 런타임 버전 보고 및 venv 생성에 사용하는 인터프리터
    pub python: String,
    /// 격리 환경 디렉터리
    pub env_dir: PathBuf,
    /// apt가 감지되면 설치할 패키지
    pub system_packages: Vec<String>,
    /// Homebrew가 감지되면 설치할 패키지
    pub brew_packages: Vec<String>,
    /// 설치 전에 보고만 하는 (필수 아님) 도구
    pub prerequisite_tools: Vec<String>,
    /// 프로젝트와 함께 설치할 extras 그룹 (`.[dev]`)
    pub pip_extras: String,
    /// 프로젝트 이후 설치하는 빌드 도구
    pub extra_pip_packages: Vec<String>,
    /// sentence-transformers 임베딩 모델 식별자
    pub embedding_model: String,
    /// 추론 런타임으로 받을 LLM 가중치 태그
    pub llm_model: String,
    /// 추론 런타임 바이너리 (비어 있으면 검증 실패)
    pub runtime_binary: String,
    /// 런타임이 없을 때 받아 실행할 설치 스크립트
    pub runtime_install_url: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_owned(),
            env_dir: PathBuf::from("minerva-env"),
            system_packages: vec![
                "python3-venv".to_owned(),
                "python3-dev".to_owned(),
                "build-essential".to_owned(),
                "curl".to_owned(),
                "git".to_owned(),
            ],
            brew_packages: vec!["python@3.11".to_owned(), "curl".to_owned(), "git".to_owned()],
            prerequisite_tools: vec!["pip".to_owned(), "git".to_owned()],
            pip_extras: "dev".to_owned(),
            extra_pip_packages: vec!["wheel".to_owned(), "setuptools".to_owned()],
            embedding_model: "all-MiniLM-L6-v2".to_owned(),
            llm_model: "phi3:3.8b-q4_0".to_owned(),
            runtime_binary: "ollama".to_owned(),
            runtime_install_url: "https://ollama.ai/install.sh".to_owned(),
        }
    }
}

impl BootstrapConfig {
    /// 격리 환경 내부 인터프리터
    pub fn env_python(&self) -> PathBuf {
        self.env_bin("python")
    }

    /// 격리 환경 내부 pip
    pub fn env_pip(&self) -> PathBuf {
        self.env_bin("pip")
    }

    fn env_bin(&self, tool: &str) -> PathBuf {
        if cfg!(windows) {
            self.env_dir.join("Scripts").join(format!("{tool}.exe"))
        } else {
            self.env_dir.join("bin").join(tool)
        }
    }
}

/// 테스트 스테이지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestsConfig {
    /// pytest에 넘길 단위 테스트 디렉터리
    pub unit_dir: PathBuf,
    /// pytest에 넘길 통합 테스트 디렉터리
    pub integration_dir: PathBuf,
    /// 저장 용량 검사 스크립트
    pub storage_script: PathBuf,
    /// 저장 용량 한도 (GB)
    pub max_storage_gb: f64,
    /// 정확도 검사 스크립트
    pub accuracy_script: PathBuf,
    /// 벤치마크 데이터셋. 존재할 때만 정확도 스테이지 실행
    pub dataset_path: PathBuf,
    /// 정확도 검사를 `--quick`으로 실행
    pub accuracy_quick: bool,
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            unit_dir: PathBuf::from("tests/unit"),
            integration_dir: PathBuf::from("tests/integration"),
            storage_script: PathBuf::from("scripts/utils/check_storage.py"),
            max_storage_gb: 3.0,
            accuracy_script: PathBuf::from("scripts/test/test_accuracy.py"),
            dataset_path: PathBuf::from("benchmark_data/test_set.json"),
            accuracy_quick: true,
        }
    }
}

/// 컨테이너 이미지 설정
///
/// 게시 여부는 설정에 없습니다. 두 번째 위치 인자가 `publish_literal`과
/// 정확히 일치할 때만 게시합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// 저장소 이름
    pub name: String,
    /// 명시적 버전 태그
    pub version: String,
    /// 게시를 요청하는 두 번째 위치 인자 값
    pub publish_literal: String,
    /// 컨테이너 엔진 바이너리
    pub engine_binary: String,
    /// 빌드 컨텍스트 디렉터리
    pub context_dir: PathBuf,
    /// 빌드 컨텍스트 기준 Dockerfile
    pub dockerfile: PathBuf,
    /// 빌드 후 일회용 컨테이너에서 실행할 명령
    pub smoke_command: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            name: "minerva-rag".to_owned(),
            version: DEFAULT_IMAGE_VERSION.to_owned(),
            publish_literal: DEFAULT_PUBLISH_LITERAL.to_owned(),
            engine_binary: "docker".to_owned(),
            context_dir: PathBuf::from("."),
            dockerfile: PathBuf::from("Dockerfile"),
            smoke_command: vec![
                "python".to_owned(),
                "-c".to_owned(),
                "import minerva; print('minerva import OK')".to_owned(),
            ],
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_path(target: &mut PathBuf, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = PathBuf::from(val);
    }
}

fn override_bool(target: &mut bool, env_key: &str, warnings: &mut Vec<EnvOverrideWarning>) {
    override_parsed(target, env_key, "bool", warnings);
}

fn override_f64(target: &mut f64, env_key: &str, warnings: &mut Vec<EnvOverrideWarning>) {
    override_parsed(target, env_key, "number", warnings);
}

fn override_parsed<T: std::str::FromStr>(
    target: &mut T,
    env_key: &str,
    expected: &'static str,
    warnings: &mut Vec<EnvOverrideWarning>,
) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => {
                warn!(
                    env_key,
                    value = val.as_str(),
                    "failed to parse {expected} from env var, ignoring"
                );
                warnings.push(EnvOverrideWarning {
                    env_key: env_key.to_owned(),
                    value: val,
                    expected,
                });
            }
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.tests.max_storage_gb, 3.0);
        assert!(config.tests.accuracy_quick);
        assert_eq!(config.image.name, "minerva-rag");
        assert_eq!(config.image.version, "0.1.0");
        assert_eq!(config.bootstrap.llm_model, "phi3:3.8b-q4_0");
    }

    #[test]
    fn default_config_passes_validation() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = PipelineConfig::parse("").unwrap();
        assert_eq!(config.image.publish_literal, "push");
        assert_eq!(
            config.tests.dataset_path,
            PathBuf::from("benchmark_data/test_set.json")
        );
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = PipelineConfig::parse(
            r#"
[tests]
max_storage_gb = 5.5

[image]
version = "1.2.3"
"#,
        )
        .unwrap();
        assert_eq!(config.tests.max_storage_gb, 5.5);
        assert_eq!(config.image.version, "1.2.3");
        assert_eq!(config.image.name, "minerva-rag");
        assert_eq!(config.bootstrap.runtime_binary, "ollama");
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = PipelineConfig::parse("[tests\nmax_storage_gb = 1").unwrap_err();
        assert!(matches!(
            err,
            MinervaError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_unknown_log_level() {
        let mut config = PipelineConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_non_positive_storage_budget() {
        let mut config = PipelineConfig::default();
        config.tests.max_storage_gb = 0.0;
        assert!(config.validate().is_err());
        config.tests.max_storage_gb = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_tag() {
        let mut config = PipelineConfig::default();
        config.image.version = "-1.0".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("image.version"));
    }

    #[test]
    fn validate_rejects_uppercase_image_name() {
        let mut config = PipelineConfig::default();
        config.image.name = "Minerva".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_runtime_binary() {
        let mut config = PipelineConfig::default();
        config.bootstrap.runtime_binary = "  ".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bootstrap.runtime_binary"));
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
    }

    #[test]
    fn validate_rejects_empty_smoke_command() {
        let mut config = PipelineConfig::default();
        config.image.smoke_command.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn tag_rules() {
        assert!(is_valid_tag("0.1.0"));
        assert!(is_valid_tag("latest"));
        assert!(is_valid_tag("_rc1"));
        assert!(is_valid_tag("1.2.3-beta.1"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag(".hidden"));
        assert!(!is_valid_tag("1.0+build"));
        assert!(!is_valid_tag(&"a".repeat(129)));
    }

    #[test]
    fn resolve_joins_relative_paths_onto_work_dir() {
        let mut config = PipelineConfig::default();
        config.general.work_dir = PathBuf::from("/srv/minerva");
        assert_eq!(
            config.resolve("benchmark_data/test_set.json"),
            PathBuf::from("/srv/minerva/benchmark_data/test_set.json")
        );
        assert_eq!(config.resolve("/abs/file"), PathBuf::from("/abs/file"));
    }

    #[test]
    fn env_python_lives_inside_env_dir() {
        let config = BootstrapConfig::default();
        if !cfg!(windows) {
            assert_eq!(config.env_python(), PathBuf::from("minerva-env/bin/python"));
            assert_eq!(config.env_pip(), PathBuf::from("minerva-env/bin/pip"));
        }
    }

    #[test]
    #[serial]
    fn env_override_f64() {
        let mut config = PipelineConfig::default();
        // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 건드리지 않습니다.
        unsafe { std::env::set_var("MINERVA_TESTS_MAX_STORAGE_GB", "4.5") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("MINERVA_TESTS_MAX_STORAGE_GB") };
        assert_eq!(config.tests.max_storage_gb, 4.5);
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = true;
        // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 건드리지 않습니다.
        unsafe { std::env::set_var("TEST_MINERVA_BOOL_BAD", "yes-please") };
        let mut warnings = Vec::new();
        override_bool(&mut val, "TEST_MINERVA_BOOL_BAD", &mut warnings);
        unsafe { std::env::remove_var("TEST_MINERVA_BOOL_BAD") };
        assert!(val);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].expected, "bool");
    }

    #[test]
    #[serial]
    fn unparsable_env_override_is_recorded() {
        let mut config = PipelineConfig::default();
        // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 건드리지 않습니다.
        unsafe { std::env::set_var("MINERVA_TESTS_MAX_STORAGE_GB", "lots") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("MINERVA_TESTS_MAX_STORAGE_GB") };

        assert_eq!(config.tests.max_storage_gb, 3.0);
        let warnings = config.env_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].env_key, "MINERVA_TESTS_MAX_STORAGE_GB");
        assert_eq!(warnings[0].value, "lots");
        assert_eq!(
            warnings[0].to_string(),
            "ignoring MINERVA_TESTS_MAX_STORAGE_GB='lots': expected a number"
        );

        // 다시 적용하면 이전 경고는 사라짐
        config.apply_env_overrides();
        assert!(config.env_warnings().is_empty());
    }

    #[test]
    #[serial]
    fn publish_env_var_is_not_a_config_field() {
        let mut config = PipelineConfig::default();
        // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 건드리지 않습니다.
        unsafe { std::env::set_var("MINERVA_IMAGE_PUBLISH", "true") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("MINERVA_IMAGE_PUBLISH") };

        let serialized = toml::to_string(&config.image).unwrap();
        assert!(!serialized.contains("publish ="));
        assert!(config.env_warnings().is_empty());
    }

    #[test]
    #[serial]
    fn env_override_csv_drops_empty_items() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 건드리지 않습니다.
        unsafe { std::env::set_var("TEST_MINERVA_CSV", "curl, git,, ") };
        override_csv(&mut val, "TEST_MINERVA_CSV");
        unsafe { std::env::remove_var("TEST_MINERVA_CSV") };
        assert_eq!(val, vec!["curl", "git"]);
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_MINERVA_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = PipelineConfig::from_file("/nonexistent/path/minerva.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MinervaError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    #[serial]
    async fn load_or_default_tolerates_missing_file() {
        let config = PipelineConfig::load_or_default("/nonexistent/path/minerva.toml")
            .await
            .unwrap();
        assert_eq!(config.image.name, "minerva-rag");
    }
}
