//! 테스트 더블 -- 명령 실행 및 보고 trait용
//!
//! 이 크레이트의 테스트와, `test-util` feature를 통해 다른 워크스페이스
//! 크레이트의 테스트에서 사용합니다.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::command::{CommandOutput, CommandRunner, CommandSpec, CommandStatus};
use crate::report::{NoteLevel, Reporter};
use crate::stage::{Stage, StageRecord};

#[derive(Debug, Default)]
struct Script {
    /// (pattern, exit code): first match wins
    failures: Vec<(String, i32)>,
    /// Programs that cannot be spawned and fail their probe
    missing: Vec<String>,
    /// (program, pattern): probe fails until a command containing pattern ran
    absent_until: Vec<(String, String)>,
    /// (pattern, stdout) for `capture`
    outputs: Vec<(String, String)>,
    invocations: Vec<CommandSpec>,
    probes: Vec<String>,
}

/// 종료 코드를 스크립트로 지정하는 가짜 러너
///
/// 명령줄에 [`fail`](Self::fail)로 등록한 패턴이 없으면 모든 명령이 성공합니다.
/// 복제본은 상태를 공유하므로 테스트 대상에 넘긴 복제본도 원본에 기록합니다.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    script: Arc<Mutex<Script>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 명령줄에 `pattern`이 포함되면 `code`로 종료
    pub fn fail(self, pattern: &str, code: i32) -> Self {
        self.lock().failures.push((pattern.to_owned(), code));
        self
    }

    /// `program` 미설치: probe 실패, 실행 시 spawn 에러
    pub fn missing(self, program: &str) -> Self {
        self.lock().missing.push(program.to_owned());
        self
    }

    /// `pattern`을 포함한 명령이 실행될 때까지 `program`의 probe가 실패
    /// (그 명령이 설치한 것처럼)
    pub fn absent_until(self, program: &str, pattern: &str) -> Self {
        self.lock()
            .absent_until
            .push((program.to_owned(), pattern.to_owned()));
        self
    }

    /// `pattern`을 포함한 명령의 `capture`가 `stdout`을 출력
    pub fn output(self, pattern: &str, stdout: &str) -> Self {
        self.lock()
            .outputs
            .push((pattern.to_owned(), stdout.to_owned()));
        self
    }

    /// 실행 또는 캡처된 모든 명령 (순서대로)
    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.lock().invocations.clone()
    }

    /// 명령줄 문자열 (순서대로)
    pub fn commands(&self) -> Vec<String> {
        self.lock()
            .invocations
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn programs(&self) -> Vec<String> {
        self.lock()
            .invocations
            .iter()
            .map(|c| c.program.clone())
            .collect()
    }

    /// probe된 프로그램 (순서대로)
    pub fn probes(&self) -> Vec<String> {
        self.lock().probes.clone()
    }

    /// 실행된 명령줄 중 `pattern`을 포함한 것이 있는지
    pub fn ran(&self, pattern: &str) -> bool {
        self.commands().iter().any(|c| c.contains(pattern))
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn status_for(&self, spec: &CommandSpec) -> std::io::Result<CommandStatus> {
        let mut script = self.lock();
        script.invocations.push(spec.clone());
        if script.missing.iter().any(|m| *m == spec.program) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: command not found", spec.program),
            ));
        }
        let line = spec.to_string();
        let code = script
            .failures
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map_or(0, |(_, code)| *code);
        Ok(CommandStatus::from_code(code))
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandStatus> {
        self.status_for(spec)
    }

    async fn capture(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        let status = self.status_for(spec)?;
        let line = spec.to_string();
        let stdout = self
            .lock()
            .outputs
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(CommandOutput {
            status,
            stdout,
            stderr: String::new(),
        })
    }

    async fn probe(&self, program: &str) -> bool {
        let mut script = self.lock();
        script.probes.push(program.to_owned());
        if script.missing.iter().any(|m| m == program) {
            return false;
        }
        script
            .absent_until
            .iter()
            .filter(|(p, _)| p == program)
            .all(|(_, pattern)| {
                script
                    .invocations
                    .iter()
                    .any(|c| c.to_string().contains(pattern.as_str()))
            })
    }
}

/// 검증용으로 평탄화한 reporter 호출
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Section(String),
    Started { ordinal: usize, name: String },
    Finished { name: String, success: bool },
    Skipped { name: String, reason: String },
    Note { level: NoteLevel, message: String },
    Banner(String),
}

/// 모든 호출을 보관하는 reporter
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<ReportEvent>,
}

impl RecordingReporter {
    /// 완료 및 건너뜀 이벤트만 (순서대로)
    pub fn finished_and_skipped(&self) -> Vec<ReportEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, ReportEvent::Finished { .. } | ReportEvent::Skipped { .. }))
            .cloned()
            .collect()
    }

    /// `level` 노트의 메시지들
    pub fn notes(&self, level: NoteLevel) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Note { level: l, message } if *l == level => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_banner(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, ReportEvent::Banner(_)))
    }
}

impl Reporter for RecordingReporter {
    fn section(&mut self, title: &str) {
        self.events.push(ReportEvent::Section(title.to_owned()));
    }

    fn stage_started(&mut self, ordinal: usize, stage: &Stage) {
        self.events.push(ReportEvent::Started {
            ordinal,
            name: stage.name.clone(),
        });
    }

    fn stage_finished(&mut self, record: &StageRecord) {
        self.events.push(ReportEvent::Finished {
            name: record.name.clone(),
            success: record.is_success(),
        });
    }

    fn stage_skipped(&mut self, name: &str, reason: &str) {
        self.events.push(ReportEvent::Skipped {
            name: name.to_owned(),
            reason: reason.to_owned(),
        });
    }

    fn note(&mut self, level: NoteLevel, message: &str) {
        self.events.push(ReportEvent::Note {
            level,
            message: message.to_owned(),
        });
    }

    fn banner(&mut self, message: &str) {
        self.events.push(ReportEvent::Banner(message.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_runner_defaults_to_success() {
        let runner = ScriptedRunner::new();
        let status = runner.run(&CommandSpec::new("anything")).await.unwrap();
        assert!(status.success());
        assert!(runner.probe("anything").await);
    }

    #[tokio::test]
    async fn scripted_runner_applies_failures_and_missing() {
        let runner = ScriptedRunner::new()
            .fail("pytest tests/unit", 3)
            .missing("docker");
        let status = runner
            .run(&CommandSpec::new("python").args(["-m", "pytest", "tests/unit"]))
            .await
            .unwrap();
        assert_eq!(status.code, Some(3));
        assert!(runner.run(&CommandSpec::new("docker")).await.is_err());
        assert!(!runner.probe("docker").await);
        assert_eq!(runner.probes(), vec!["docker"]);
    }

    #[tokio::test]
    async fn clones_share_recorded_invocations() {
        let runner = ScriptedRunner::new();
        let clone = runner.clone();
        clone.run(&CommandSpec::new("git")).await.unwrap();
        assert_eq!(runner.programs(), vec!["git"]);
    }

    #[tokio::test]
    async fn absent_until_flips_after_install_command() {
        let runner = ScriptedRunner::new().absent_until("ollama", "install.sh");
        assert!(!runner.probe("ollama").await);
        runner
            .run(&CommandSpec::shell("curl -fsSL https://ollama.ai/install.sh | sh"))
            .await
            .unwrap();
        assert!(runner.probe("ollama").await);
    }

    #[tokio::test]
    async fn capture_returns_scripted_stdout() {
        let runner = ScriptedRunner::new().output("--version", "Python 3.11.4\n");
        let out = runner
            .capture(&CommandSpec::new("python3").arg("--version"))
            .await
            .unwrap();
        assert_eq!(out.stdout, "Python 3.11.4\n");
    }
}
