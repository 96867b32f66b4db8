//! The fixed test stage order.

use std::path::Path;

use minerva_core::command::CommandSpec;
use minerva_core::config::PipelineConfig;
use minerva_core::stage::{Condition, SkippedStage, Stage, StagePlan};

pub const STAGE_UNIT: &str = "unit tests";
pub const STAGE_INTEGRATION: &str = "integration tests";
pub const STAGE_STORAGE: &str = "storage check";
pub const STAGE_ACCURACY: &str = "accuracy check";

/// unit → integration → storage → accuracy (only with a dataset).
#[derive(Debug, Clone)]
pub struct TestPlan {
    plan: StagePlan,
}

impl TestPlan {
    /// Build the plan. The dataset check happens here, once.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let tests = &config.tests;
        let python = config
            .resolve(config.bootstrap.env_python())
            .to_string_lossy()
            .into_owned();

        let pytest = |dir: &Path| {
            CommandSpec::new(&python)
                .args(["-m", "pytest"])
                .path_arg(dir)
                .arg("-v")
        };

        let storage = CommandSpec::new(&python)
            .path_arg(&tests.storage_script)
            .arg("--max-size")
            .arg(format_gb(tests.max_storage_gb));

        let mut accuracy = CommandSpec::new(&python)
            .path_arg(&tests.accuracy_script)
            .arg("--data")
            .path_arg(&tests.dataset_path);
        if tests.accuracy_quick {
            accuracy = accuracy.arg("--quick");
        }

        let mut plan = StagePlan::new();
        plan.push(Stage::new(STAGE_UNIT, pytest(tests.unit_dir.as_path())))
            .push(Stage::new(STAGE_INTEGRATION, pytest(tests.integration_dir.as_path())))
            .push(Stage::new(STAGE_STORAGE, storage))
            .push_if(
                &Condition::FileExists(config.resolve(&tests.dataset_path)),
                Stage::new(STAGE_ACCURACY, accuracy),
            );

        Self { plan }
    }

    pub fn names(&self) -> Vec<&str> {
        self.plan.names()
    }

    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.plan.stages()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SkippedStage> {
        self.plan.skipped()
    }

    pub fn into_plan(self) -> StagePlan {
        self.plan
    }
}

/// `3.0` → "3.0", `2.75` → "2.75".
fn format_gb(gb: f64) -> String {
    if gb.fract() == 0.0 {
        format!("{gb:.1}")
    } else {
        gb.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.general.work_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn accuracy_excluded_without_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let plan = TestPlan::from_config(&config_in(dir.path()));
        assert_eq!(plan.names(), vec![STAGE_UNIT, STAGE_INTEGRATION, STAGE_STORAGE]);
        let skipped: Vec<_> = plan.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].name, STAGE_ACCURACY);
        assert!(skipped[0].reason.contains("test_set.json"));
    }

    #[test]
    fn accuracy_included_with_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let dataset = config.resolve(&config.tests.dataset_path);
        std::fs::create_dir_all(dataset.parent().unwrap()).unwrap();
        std::fs::write(&dataset, "[]").unwrap();

        let plan = TestPlan::from_config(&config);
        assert_eq!(
            plan.names(),
            vec![STAGE_UNIT, STAGE_INTEGRATION, STAGE_STORAGE, STAGE_ACCURACY]
        );
        let accuracy = plan.stages().last().unwrap().command.to_string();
        assert!(accuracy.ends_with(
            "scripts/test/test_accuracy.py --data benchmark_data/test_set.json --quick"
        ));
    }

    #[test]
    fn quick_flag_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.tests.accuracy_quick = false;
        std::fs::create_dir_all(dir.path().join("benchmark_data")).unwrap();
        std::fs::write(dir.path().join("benchmark_data/test_set.json"), "[]").unwrap();

        let plan = TestPlan::from_config(&config);
        let accuracy = plan.stages().last().unwrap();
        assert!(!accuracy.command.args.contains(&"--quick".to_owned()));
    }

    #[test]
    fn storage_check_passes_budget() {
        let dir = tempfile::tempdir().unwrap();
        let plan = TestPlan::from_config(&config_in(dir.path()));
        let storage = plan.stages().nth(2).unwrap();
        assert!(
            storage
                .command
                .to_string()
                .ends_with("scripts/utils/check_storage.py --max-size 3.0")
        );
    }

    #[test]
    fn pytest_targets_each_category() {
        let dir = tempfile::tempdir().unwrap();
        let plan = TestPlan::from_config(&config_in(dir.path()));
        let commands: Vec<_> = plan.stages().map(|s| s.command.args.clone()).collect();
        assert_eq!(commands[0], vec!["-m", "pytest", "tests/unit", "-v"]);
        assert_eq!(commands[1], vec!["-m", "pytest", "tests/integration", "-v"]);
    }

    #[test]
    fn gb_formatting() {
        assert_eq!(format_gb(3.0), "3.0");
        assert_eq!(format_gb(2.75), "2.75");
        assert_eq!(format_gb(10.0), "10.0");
    }
}
