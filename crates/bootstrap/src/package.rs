//! System package manager detection.
//!
//! The installer asks [`detect_package_manager`] which manager exists on the
//! host. A host without a known manager gets [`AbsentPackageManager`], and
//! the system-package stage is skipped rather than failed.

use minerva_core::command::{CommandRunner, CommandSpec};
use minerva_core::config::BootstrapConfig;

/// A system package manager the installer can drive.
pub trait PackageManager: Send + Sync {
    /// Short name shown in progress output.
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    /// Command installing the configured package set, or `None` when there
    /// is nothing to install with this manager.
    fn install_command(&self, config: &BootstrapConfig) -> Option<CommandSpec>;
}

/// Debian/Ubuntu `apt-get`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Apt;

impl PackageManager for Apt {
    fn name(&self) -> &'static str {
        "apt-get"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn install_command(&self, config: &BootstrapConfig) -> Option<CommandSpec> {
        if config.system_packages.is_empty() {
            return None;
        }
        Some(CommandSpec::shell(format!(
            "sudo apt-get update && sudo apt-get install -y {}",
            config.system_packages.join(" ")
        )))
    }
}

/// Homebrew on macOS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Brew;

impl PackageManager for Brew {
    fn name(&self) -> &'static str {
        "brew"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn install_command(&self, config: &BootstrapConfig) -> Option<CommandSpec> {
        if config.brew_packages.is_empty() {
            return None;
        }
        Some(
            CommandSpec::new("brew")
                .arg("install")
                .args(config.brew_packages.iter().cloned()),
        )
    }
}

/// No supported package manager on this host.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsentPackageManager;

impl PackageManager for AbsentPackageManager {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn install_command(&self, _config: &BootstrapConfig) -> Option<CommandSpec> {
        None
    }
}

/// Probe for `apt-get`, then `brew`.
pub async fn detect_package_manager<R: CommandRunner>(runner: &R) -> Box<dyn PackageManager> {
    if runner.probe("apt-get").await {
        tracing::debug!(manager = "apt-get", "package manager detected");
        return Box::new(Apt);
    }
    if runner.probe("brew").await {
        tracing::debug!(manager = "brew", "package manager detected");
        return Box::new(Brew);
    }
    tracing::info!("no system package manager detected");
    Box::new(AbsentPackageManager)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerva_core::testing::ScriptedRunner;

    #[tokio::test]
    async fn apt_preferred_when_present() {
        let runner = ScriptedRunner::new();
        let manager = detect_package_manager(&runner).await;
        assert_eq!(manager.name(), "apt-get");
        assert_eq!(runner.probes(), vec!["apt-get"]);
    }

    #[tokio::test]
    async fn brew_used_without_apt() {
        let runner = ScriptedRunner::new().missing("apt-get");
        let manager = detect_package_manager(&runner).await;
        assert_eq!(manager.name(), "brew");
    }

    #[tokio::test]
    async fn absent_when_neither_probe_succeeds() {
        let runner = ScriptedRunner::new().missing("apt-get").missing("brew");
        let manager = detect_package_manager(&runner).await;
        assert!(!manager.is_available());
        assert!(manager.install_command(&BootstrapConfig::default()).is_none());
    }

    #[test]
    fn apt_installs_every_configured_package() {
        let cmd = Apt
            .install_command(&BootstrapConfig::default())
            .unwrap()
            .to_string();
        for pkg in ["python3-venv", "python3-dev", "build-essential", "curl", "git"] {
            assert!(cmd.contains(pkg), "{pkg} missing from {cmd}");
        }
        assert!(cmd.contains("apt-get install -y"));
    }

    #[test]
    fn brew_uses_its_own_list() {
        let cmd = Brew.install_command(&BootstrapConfig::default()).unwrap();
        assert_eq!(cmd.argv(), vec!["brew", "install", "python@3.11", "curl", "git"]);
    }

    #[test]
    fn empty_package_list_installs_nothing() {
        let config = BootstrapConfig {
            system_packages: Vec::new(),
            ..BootstrapConfig::default()
        };
        assert!(Apt.install_command(&config).is_none());
    }
}
