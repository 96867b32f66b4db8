//! Local inference runtime.

use minerva_core::command::{CommandRunner, CommandSpec};
use minerva_core::config::BootstrapConfig;

/// The runtime that serves LLM weights locally.
pub trait InferenceRuntime: Send + Sync {
    /// Binary probed and invoked for this runtime.
    fn binary(&self) -> &str;

    /// Whether the binary was found when the runtime was detected.
    fn is_available(&self) -> bool;

    /// Command installing the runtime, if it can be installed.
    fn install_command(&self) -> Option<CommandSpec>;

    /// Command fetching model weights by tag.
    fn pull_command(&self, model: &str) -> Option<CommandSpec>;
}

/// Ollama, installed through its upstream install script.
#[derive(Debug, Clone)]
pub struct Ollama {
    binary: String,
    install_url: String,
    available: bool,
}

impl Ollama {
    pub fn new(binary: impl Into<String>, install_url: impl Into<String>, available: bool) -> Self {
        Self {
            binary: binary.into(),
            install_url: install_url.into(),
            available,
        }
    }
}

impl InferenceRuntime for Ollama {
    fn binary(&self) -> &str {
        &self.binary
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn install_command(&self) -> Option<CommandSpec> {
        Some(CommandSpec::shell(format!(
            "curl -fsSL {} | sh",
            self.install_url
        )))
    }

    fn pull_command(&self, model: &str) -> Option<CommandSpec> {
        Some(CommandSpec::new(&self.binary).arg("pull").arg(model))
    }
}

/// No runtime configured; every runtime step is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsentRuntime;

impl InferenceRuntime for AbsentRuntime {
    fn binary(&self) -> &str {
        ""
    }

    fn is_available(&self) -> bool {
        false
    }

    fn install_command(&self) -> Option<CommandSpec> {
        None
    }

    fn pull_command(&self, _model: &str) -> Option<CommandSpec> {
        None
    }
}

/// Probe for the configured runtime binary.
///
/// An empty `runtime_binary` yields [`AbsentRuntime`]. `PipelineConfig::validate`
/// rejects that, so only callers that skip validation reach it.
pub async fn detect_runtime<R: CommandRunner>(
    runner: &R,
    config: &BootstrapConfig,
) -> Box<dyn InferenceRuntime> {
    if config.runtime_binary.trim().is_empty() {
        return Box::new(AbsentRuntime);
    }
    let available = runner.probe(&config.runtime_binary).await;
    tracing::debug!(runtime = %config.runtime_binary, available, "inference runtime probed");
    Box::new(Ollama::new(
        &config.runtime_binary,
        &config.runtime_install_url,
        available,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerva_core::testing::ScriptedRunner;

    #[tokio::test]
    async fn detects_installed_runtime() {
        let runner = ScriptedRunner::new();
        let runtime = detect_runtime(&runner, &BootstrapConfig::default()).await;
        assert!(runtime.is_available());
        assert_eq!(runtime.binary(), "ollama");
    }

    #[tokio::test]
    async fn missing_runtime_still_installable() {
        let runner = ScriptedRunner::new().missing("ollama");
        let runtime = detect_runtime(&runner, &BootstrapConfig::default()).await;
        assert!(!runtime.is_available());
        let install = runtime.install_command().unwrap().to_string();
        assert!(install.contains("curl -fsSL https://ollama.ai/install.sh | sh"));
    }

    #[tokio::test]
    async fn empty_binary_means_absent_runtime() {
        let config = BootstrapConfig {
            runtime_binary: String::new(),
            ..BootstrapConfig::default()
        };
        let runner = ScriptedRunner::new();
        let runtime = detect_runtime(&runner, &config).await;
        assert!(runtime.pull_command("phi3:3.8b-q4_0").is_none());
        assert!(runner.probes().is_empty());
    }

    #[test]
    fn pull_uses_model_tag() {
        let ollama = Ollama::new("ollama", "https://ollama.ai/install.sh", true);
        assert_eq!(
            ollama.pull_command("phi3:3.8b-q4_0").unwrap().argv(),
            vec!["ollama", "pull", "phi3:3.8b-q4_0"]
        );
    }
}
