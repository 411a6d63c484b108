use std::fs;

use kira_karyotype::config::ExperimentConfig;
use kira_karyotype::pairing::PairingMode;
use tempfile::TempDir;

#[test]
fn defaults_match_chromosome_experiment() {
    let config = ExperimentConfig::default();
    assert_eq!(config.cls_num, 24);
    assert_eq!(config.train_pairing, PairingMode::Loose);
    assert_eq!(config.balance_constant, 100.0);
    assert_eq!(config.max_pairs, 5_000_000);
    assert_eq!(config.train.samples_num, 2000);
    assert_eq!(config.train.batch_size, 16);
    assert_eq!(config.train.best_metric, "f1_score");
    assert_eq!(config.aug_params.onlyresize.output_shape, [224, 224]);
    assert!(config.aug_params.augmentation.flip);
    assert!(!config.aug_params.onlyresize.flip);
    config.validate().unwrap();
}

#[test]
fn partial_json_keeps_other_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("exp.json");
    fs::write(
        &path,
        r#"{"name": "small", "cls_num": 3, "eval_pairing": "strict", "train": {"batch_size": 4}}"#,
    )
    .unwrap();

    let config = ExperimentConfig::load(&path).unwrap();
    assert_eq!(config.name, "small");
    assert_eq!(config.cls_num, 3);
    assert_eq!(config.eval_pairing, PairingMode::Strict);
    assert_eq!(config.train.batch_size, 4);
    assert_eq!(config.train.samples_num, 2000);
}

#[test]
fn invalid_values_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("exp.json");
    fs::write(&path, r#"{"cls_num": 0}"#).unwrap();
    assert!(ExperimentConfig::load(&path).is_err());

    fs::write(&path, "{not json").unwrap();
    assert!(ExperimentConfig::load(&path).is_err());
}
