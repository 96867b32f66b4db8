//! 외부 명령 추상화
//!
//! 파이프라인이 시작하는 모든 하위 프로세스는 [`CommandRunner`]를 거치므로
//! 스테이지는 `std::process`를 직접 다루지 않습니다. 프로덕션 코드는
//! [`SystemRunner`]를, 테스트는 `testing::ScriptedRunner`를 사용합니다.
//!
//! ```text
//!  Stage ──> CommandSpec ──> CommandRunner (trait)
//!                               │        │
//!                               ▼        ▼
//!                         SystemRunner  ScriptedRunner
//!                               │
//!                               ▼
//!                         tokio::process
//! ```

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;

/// 완전히 기술된 명령 호출
///
/// 항상 러너의 작업 디렉터리에서 상속된 환경으로 실행됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `sh -c`로 `script` 실행
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 경로 인자 추가 (UTF-8로 손실 변환)
    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        let arg = path.as_ref().to_string_lossy().into_owned();
        self.arg(arg)
    }

    /// 프로그램과 그 뒤의 인자들
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// 종료된 명령의 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandStatus {
    /// 시그널로 종료되면 `None`
    pub code: Option<i32>,
}

impl CommandStatus {
    pub const SUCCESS: Self = Self { code: Some(0) };

    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for CommandStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// 종료된 명령의 캡처된 출력
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

/// 외부 명령 실행기
///
/// 파이프라인은 호출을 한 번에 하나씩 await 하므로 구현체가 동시 호출을
/// 처리할 필요는 없습니다.
pub trait CommandRunner: Send + Sync {
    /// 상속된 stdio로 명령을 실행하고 종료를 기다립니다.
    ///
    /// # Errors
    ///
    /// 프로세스를 시작하지 못하면 I/O 에러를 반환합니다. 실행 후 실패한
    /// 명령은 성공이 아닌 상태를 담은 `Ok`입니다.
    fn run(
        &self,
        cmd: &CommandSpec,
    ) -> impl Future<Output = std::io::Result<CommandStatus>> + Send;

    /// stdout/stderr를 스트리밍하지 않고 캡처하여 실행
    fn capture(
        &self,
        cmd: &CommandSpec,
    ) -> impl Future<Output = std::io::Result<CommandOutput>> + Send;

    /// `program --version`을 조용히 실행해 설치 여부를 확인
    fn probe(&self, program: &str) -> impl Future<Output = bool> + Send;
}

/// 실제 프로세스 기반 러너
#[derive(Debug, Clone)]
pub struct SystemRunner {
    work_dir: PathBuf,
}

impl SystemRunner {
    /// 모든 명령은 `work_dir`에서 실행됩니다.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    fn command(&self, spec: &CommandSpec) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&self.work_dir)
            .kill_on_drop(true);
        cmd
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandStatus> {
        tracing::debug!(command = %spec, "running command");
        let status = self
            .command(spec)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        Ok(status.into())
    }

    async fn capture(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        tracing::debug!(command = %spec, "capturing command output");
        let output = self.command(spec).stdin(Stdio::null()).output().await?;
        Ok(CommandOutput {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn probe(&self, program: &str) -> bool {
        let result = self
            .command(&CommandSpec::new(program).arg("--version"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        let available = matches!(result, Ok(status) if status.success());
        tracing::debug!(program, available, "probed for tool");
        available
    }
}
