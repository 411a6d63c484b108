use std::path::Path;

use kira_karyotype::checkpoint::{RunLayout, best_file_name, checkpoint_file_name};
use kira_karyotype::config::ModelParams;
use kira_karyotype::model::FusionWeights;
use tempfile::TempDir;

#[test]
fn file_names_use_four_decimals() {
    assert_eq!(checkpoint_file_name(7, 0.5), "checkpoint_epoch7_0.5000.pth");
    assert_eq!(best_file_name(12, 0.912345), "best_epoch12_0.9123.pth");
}

#[test]
fn run_dir_layout() {
    let layout = RunLayout::new(
        Path::new("/data/train"),
        Path::new("/data/sets/val_2024"),
        "config_chromosome",
        3,
    );
    assert_eq!(
        layout.dir(),
        Path::new("/data/train/models/val_2024/config_chromosome/run_3")
    );
    assert_eq!(
        layout.checkpoint_path(4, 0.25),
        Path::new("/data/train/models/val_2024/config_chromosome/run_3/checkpoint_epoch4_0.2500.pth")
    );
    assert_eq!(
        layout.best_path(4, 0.25),
        Path::new("/data/train/models/val_2024/config_chromosome/run_3/best_epoch4_0.2500.pth")
    );
}

#[test]
fn prepare_refuses_existing_run_without_overwrite() {
    let tmp = TempDir::new().unwrap();
    let layout = RunLayout::new(tmp.path(), Path::new("val"), "cfg", 0);

    layout.prepare(false).unwrap();
    let weights = FusionWeights::random(&ModelParams::default(), 24);
    let saved = layout.checkpoint_path(1, 0.1);
    layout.save_weights(&weights, &saved).unwrap();
    assert!(saved.is_file());

    assert!(layout.prepare(false).is_err());
    layout.prepare(true).unwrap();
    assert!(!saved.exists());
    assert!(layout.dir().is_dir());
}

#[test]
fn save_refuses_paths_outside_the_run() {
    let tmp = TempDir::new().unwrap();
    let layout = RunLayout::new(tmp.path(), Path::new("val"), "cfg", 0);
    layout.prepare(false).unwrap();
    let weights = FusionWeights::random(&ModelParams::default(), 24);

    assert!(layout.save_weights(&weights, &tmp.path().join("stray.pth")).is_err());
}
