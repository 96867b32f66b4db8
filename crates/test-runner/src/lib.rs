//! Minerva test orchestration.
//!
//! Runs the test categories in a fixed order, timing each one:
//!
//! 1. unit tests
//! 2. integration tests
//! 3. storage footprint check against the configured budget
//! 4. accuracy check, only when the benchmark dataset exists
//!
//! The first failing stage ends the run.

pub mod orchestrator;
pub mod plan;
pub mod stage;

pub use orchestrator::{SUCCESS_BANNER, TestOrchestrator};
pub use plan::TestPlan;
pub use stage::{StageReport, run_stage};
