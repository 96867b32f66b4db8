//! Minerva container image builder.
//!
//! Builds `name:version` and `name:latest` in one invocation, lists the
//! result, smoke-tests it in a disposable container and pushes both tags
//! only when publishing was explicitly requested and the smoke test passed.
//!
//! # Module Structure
//!
//! - [`artifact`]: `ImageArtifact` lifecycle and `PublishRequest`
//! - [`engine`]: `ContainerEngine` trait, `DockerEngine`, `AbsentEngine`
//! - [`builder`]: `ImageBuilder`, the staged build
//! - [`error`]: `ImageError`

pub mod artifact;
pub mod builder;
pub mod engine;
pub mod error;

pub use artifact::{BuildStatus, ImageArtifact, PublishRequest, PublishStatus, SmokeStatus};
pub use builder::ImageBuilder;
pub use engine::{AbsentEngine, ContainerEngine, DockerEngine, LocalImage};
pub use error::ImageError;
