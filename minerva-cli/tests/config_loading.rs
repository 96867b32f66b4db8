//! Configuration loading with command-line overrides.

use std::path::PathBuf;

use minerva_cli::app::load_config;
use minerva_cli::cli::{CommonArgs, ImageArgs};
use minerva_core::error::EXIT_CONFIG;
use tempfile::TempDir;

fn common(config: Option<PathBuf>) -> CommonArgs {
    CommonArgs {
        config,
        ..CommonArgs::default()
    }
}

#[tokio::test]
async fn explicit_missing_file_is_a_config_error() {
    // Given: a path that does not exist
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("missing.toml");

    // When
    let err = load_config(&common(Some(path)), &ImageArgs::default())
        .await
        .expect_err("missing explicit config should fail");

    // Then
    assert_eq!(err.exit_code(), EXIT_CONFIG);
}

#[tokio::test]
async fn file_values_then_cli_overrides() {
    // Given: a config file with a version and a log level
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("minerva.toml");
    std::fs::write(
        &path,
        r#"
[general]
log_level = "warn"
work_dir = "/srv/minerva"

[tests]
max_storage_gb = 5.0

[image]
version = "0.9.0"
"#,
    )
    .expect("failed to write config");

    let common = CommonArgs {
        config: Some(path),
        log_level: Some("debug".to_owned()),
        ..CommonArgs::default()
    };
    let image = ImageArgs {
        version: Some("1.2.3".to_owned()),
        push: None,
    };

    // When
    let config = load_config(&common, &image)
        .await
        .expect("config should load");

    // Then: the file is read and the command line wins
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.image.version, "1.2.3");
    assert_eq!(config.general.work_dir, PathBuf::from("/srv/minerva"));
    assert!((config.tests.max_storage_gb - 5.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn invalid_positional_version_is_rejected() {
    // Given
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("minerva.toml");
    std::fs::write(&path, "").expect("failed to write config");
    let image = ImageArgs {
        version: Some("bad tag!".to_owned()),
        push: None,
    };

    // When
    let err = load_config(&common(Some(path)), &image)
        .await
        .expect_err("invalid tag should fail");

    // Then
    assert_eq!(err.exit_code(), EXIT_CONFIG);
    assert!(err.to_string().contains("bad tag!"));
}

#[tokio::test]
async fn relative_work_dir_is_anchored() {
    // Given: a file leaving work_dir at its relative default
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("minerva.toml");
    std::fs::write(&path, "[image]\nname = \"minerva-rag\"\n").expect("failed to write config");

    // When
    let config = load_config(&common(Some(path)), &ImageArgs::default())
        .await
        .expect("config should load");

    // Then
    assert!(config.general.work_dir.is_absolute());
}

#[tokio::test]
async fn empty_runtime_binary_is_rejected_before_anything_runs() {
    // Given: a config that names no inference runtime
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("minerva.toml");
    std::fs::write(&path, "[bootstrap]\nruntime_binary = \"\"\n").expect("failed to write config");

    // When
    let err = load_config(&common(Some(path)), &ImageArgs::default())
        .await
        .expect_err("empty runtime binary should fail validation");

    // Then
    assert_eq!(err.exit_code(), EXIT_CONFIG);
    assert!(err.to_string().contains("bootstrap.runtime_binary"));
}
