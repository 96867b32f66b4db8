//! Container engine abstraction.
//!
//! Build, smoke-test and push go through the engine's CLI so their output
//! streams to the terminal like any other stage. Listing local images uses
//! the Docker API through `bollard`.
//!
//! ```text
//!   ImageBuilder
//!        │
//!        ▼
//! ContainerEngine (trait)
//!    │         │
//!    ▼         ▼
//! DockerEngine  AbsentEngine
//!    │    │
//!    │    └──> bollard ──> Docker daemon (list_images)
//!    ▼
//! CommandRunner ──> docker build / run / push
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use serde::Serialize;

use minerva_core::command::{CommandRunner, CommandSpec};

use crate::error::ImageError;

/// An image present in the local engine store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalImage {
    pub id: String,
    pub tags: Vec<String>,
    pub size_bytes: u64,
}

impl LocalImage {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Operations the builder needs from a container engine.
pub trait ContainerEngine: Send + Sync {
    /// CLI binary name, used in diagnostics.
    fn binary(&self) -> &str;

    /// Result of the pre-flight probe.
    fn is_available(&self) -> bool;

    /// One build invocation applying every tag in `tags`.
    fn build_command(&self, tags: &[String], dockerfile: &Path, context: &Path) -> CommandSpec;

    /// Run `command` in a disposable container from `image`.
    fn smoke_command(&self, image: &str, command: &[String]) -> CommandSpec;

    fn push_command(&self, tag: &str) -> CommandSpec;

    /// Local images whose reference matches `reference`.
    ///
    /// # Errors
    ///
    /// `DockerApi` if the engine API cannot be reached or the call fails.
    fn list_images(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<Vec<LocalImage>, ImageError>> + Send;
}

/// Docker CLI plus the Docker API for listing.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    binary: String,
    available: bool,
}

impl DockerEngine {
    pub fn new(binary: impl Into<String>, available: bool) -> Self {
        Self {
            binary: binary.into(),
            available,
        }
    }

    /// Probe for `binary` and remember the result.
    pub async fn detect<R: CommandRunner>(runner: &R, binary: &str) -> Self {
        let available = runner.probe(binary).await;
        tracing::debug!(engine = binary, available, "container engine probed");
        Self::new(binary, available)
    }
}

impl ContainerEngine for DockerEngine {
    fn binary(&self) -> &str {
        &self.binary
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn build_command(&self, tags: &[String], dockerfile: &Path, context: &Path) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.binary).arg("build");
        for tag in tags {
            cmd = cmd.arg("-t").arg(tag);
        }
        cmd.arg("-f").path_arg(dockerfile).path_arg(context)
    }

    fn smoke_command(&self, image: &str, command: &[String]) -> CommandSpec {
        CommandSpec::new(&self.binary)
            .args(["run", "--rm", image])
            .args(command.iter().cloned())
    }

    fn push_command(&self, tag: &str) -> CommandSpec {
        CommandSpec::new(&self.binary).arg("push").arg(tag)
    }

    async fn list_images(&self, reference: &str) -> Result<Vec<LocalImage>, ImageError> {
        use bollard::image::ListImagesOptions;

        let docker = bollard::Docker::connect_with_local_defaults()
            .map_err(|e| ImageError::DockerApi(format!("failed to connect to docker: {e}")))?;

        let options = ListImagesOptions::<String> {
            all: false,
            filters: HashMap::from([("reference".to_owned(), vec![reference.to_owned()])]),
            ..Default::default()
        };

        let images = docker
            .list_images(Some(options))
            .await
            .map_err(|e| ImageError::DockerApi(format!("list images failed: {e}")))?;

        Ok(images
            .into_iter()
            .map(|summary| LocalImage {
                id: summary.id,
                tags: summary.repo_tags,
                size_bytes: u64::try_from(summary.size).unwrap_or(0),
            })
            .collect())
    }
}

/// No container engine on this host. Pre-flight always fails.
#[derive(Debug, Clone)]
pub struct AbsentEngine {
    binary: String,
}

impl AbsentEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl ContainerEngine for AbsentEngine {
    fn binary(&self) -> &str {
        &self.binary
    }

    fn is_available(&self) -> bool {
        false
    }

    fn build_command(&self, _tags: &[String], _dockerfile: &Path, _context: &Path) -> CommandSpec {
        CommandSpec::new(&self.binary)
    }

    fn smoke_command(&self, _image: &str, _command: &[String]) -> CommandSpec {
        CommandSpec::new(&self.binary)
    }

    fn push_command(&self, _tag: &str) -> CommandSpec {
        CommandSpec::new(&self.binary)
    }

    async fn list_images(&self, _reference: &str) -> Result<Vec<LocalImage>, ImageError> {
        Ok(Vec::new())
    }
}
