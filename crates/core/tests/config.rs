use std::fs;
use std::time::Duration;

use qrbench_core::config::{load_eval_config, EvalConfig};
use qrbench_core::services::raster::RasterSize;
use qrbench_core::services::validator::ExtractionPolicy;
use tempfile::tempdir;

#[test]
fn defaults_describe_the_reference_setup() {
    let config = EvalConfig::default();
    assert_eq!(config.extraction, ExtractionPolicy::Permissive);
    assert_eq!(config.raster_size(), RasterSize::square(512));
    assert_eq!(config.margin, 16);
    assert_eq!(config.timeout(), Some(Duration::from_secs(10)));
    assert_eq!(config.workers, None);
    assert_eq!(config.max_stalled_workers, 8);
    assert!(config.save_svgs);
    config.validate().expect("defaults are valid");
}

#[test]
fn partial_yaml_keeps_other_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eval.yaml");
    fs::write(&path, "extraction: strict\nworkers: 4\ntimeout_ms: null\n").unwrap();

    let config = load_eval_config(&path).expect("load yaml");
    assert_eq!(config.extraction, ExtractionPolicy::Strict);
    assert_eq!(config.workers, Some(4));
    assert_eq!(config.timeout(), None);
    assert_eq!(config.raster_width, 512);
    assert!(config.save_svgs);
}

#[test]
fn json_config_is_read_by_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eval.json");
    fs::write(&path, r#"{"raster_width": 256, "raster_height": 300, "save_svgs": false}"#).unwrap();

    let config = load_eval_config(&path).expect("load json");
    assert_eq!(config.raster_size(), RasterSize::new(256, 300));
    assert!(!config.save_svgs);
    assert_eq!(config.extraction, ExtractionPolicy::Permissive);
}

#[test]
fn empty_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eval.yml");
    fs::write(&path, "  \n").unwrap();
    assert_eq!(load_eval_config(&path).expect("load"), EvalConfig::default());
}

#[test]
fn invalid_values_are_rejected() {
    let dir = tempdir().unwrap();
    for (name, body) in [
        ("workers.yaml", "workers: 0\n"),
        ("size.yaml", "raster_width: 0\n"),
        ("timeout.yaml", "timeout_ms: 0\n"),
        ("stalled.yaml", "max_stalled_workers: 0\n"),
    ] {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        assert!(load_eval_config(&path).is_err(), "{name} should be rejected");
    }
}

#[test]
fn unparseable_file_reports_context() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eval.json");
    fs::write(&path, "{not json").unwrap();
    let err = load_eval_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse eval config JSON"));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_eval_config(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read eval config"));
}

#[test]
fn classifier_reflects_the_settings() {
    let config = EvalConfig {
        extraction: ExtractionPolicy::Strict,
        raster_width: 320,
        raster_height: 240,
        timeout_ms: Some(2500),
        max_stalled_workers: 3,
        ..EvalConfig::default()
    };
    let classifier = config.classifier();
    assert_eq!(classifier.policy(), ExtractionPolicy::Strict);
    assert_eq!(classifier.raster_size(), RasterSize::new(320, 240));
    assert_eq!(classifier.timeout(), Some(Duration::from_millis(2500)));
    assert_eq!(classifier.rasterizer_name(), "resvg");
    assert_eq!(classifier.max_stalled_workers(), 3);
}
