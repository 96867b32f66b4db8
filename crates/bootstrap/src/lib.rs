//! Minerva environment bootstrap.
//!
//! Provisions system packages (when a package manager is present), an
//! isolated Python environment with the project and its dev extras, the
//! embedding model, the inference runtime and the LLM weights. Any failing
//! stage aborts the bootstrap; nothing is rolled back.
//!
//! ```text
//! detect_package_manager ─┐
//!                         ├─> Installer::plan ─> PipelineRun ─> verify
//! detect_runtime ─────────┘
//! ```

pub mod installer;
pub mod package;
pub mod runtime;

pub use installer::Installer;
pub use package::{AbsentPackageManager, Apt, Brew, PackageManager, detect_package_manager};
pub use runtime::{AbsentRuntime, InferenceRuntime, Ollama, detect_runtime};
