use std::fs;
use std::path::Path;

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use serde_json::Value;
use tempfile::TempDir;

const CONFIG: &str = r#"{
  "name": "small",
  "cls_num": 3,
  "train": {"samples_num": 40, "batch_size": 4, "eval_batch_size": 2, "print_freq": 1},
  "aug_params": {
    "augmentation": {"output_shape": [8, 8], "rotation": true, "flip": true},
    "onlyresize": {"output_shape": [8, 8]}
  },
  "model": {"feature_dim": 4, "pool_grid": 2, "seed": 5}
}"#;

fn write_modality(root: &Path, modality: &str, recs: &[(&str, usize)], labels: bool) {
    let sets = root.join("ImageSets");
    let ann = root.join("annotations");
    let images = root.join("ImageData").join(format!("{}-image", modality));
    fs::create_dir_all(&sets).unwrap();
    fs::create_dir_all(&ann).unwrap();
    fs::create_dir_all(&images).unwrap();

    let manifest: String = recs.iter().map(|(id, _)| format!("{}\n", id)).collect();
    fs::write(sets.join(format!("{}.txt", modality)), manifest).unwrap();
    if labels {
        let lines: String = recs
            .iter()
            .map(|(id, l)| format!("{} {}\n", id, l))
            .collect();
        fs::write(ann.join(format!("{}.txt", modality)), lines).unwrap();
    }
    for (i, (id, label)) in recs.iter().enumerate() {
        let img = RgbImage::from_fn(10, 6, |x, y| {
            Rgb([(x * 20) as u8, (y * 30 + i as u32) as u8, (*label * 80) as u8])
        });
        img.save(images.join(format!("{}.png", id))).unwrap();
    }
}

fn write_collection(root: &Path, labels: bool) {
    write_modality(root, "original", &[("o1", 0), ("o2", 0), ("o3", 1)], labels);
    write_modality(
        root,
        "highpass",
        &[("h1_hp", 0), ("h2_hp", 1), ("h3_hp", 1)],
        labels,
    );
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.json");
    fs::write(&path, CONFIG).unwrap();
    path
}

#[test]
fn validate_reports_pairs_and_draw() {
    let tmp = TempDir::new().unwrap();
    let collection = tmp.path().join("train");
    write_collection(&collection, true);
    let config = write_config(tmp.path());

    let mut cmd = Command::cargo_bin("kira-karyotype").unwrap();
    cmd.arg("validate")
        .arg("--collection")
        .arg(&collection)
        .arg("--config")
        .arg(&config)
        .arg("--threads")
        .arg("1");
    let out = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(out).unwrap();
    assert!(stdout.contains("kira-karyotype validate ok"));
    assert!(stdout.contains("pairs: 4"));
    assert!(stdout.contains("drawn: 40"));
    assert!(stdout.contains("chr_1\t2\t1\t2"));
}

#[test]
fn validate_strict_pairing_warns_on_zero_pairs() {
    let tmp = TempDir::new().unwrap();
    let collection = tmp.path().join("train");
    write_collection(&collection, true);
    let config = write_config(tmp.path());

    let mut cmd = Command::cargo_bin("kira-karyotype").unwrap();
    cmd.arg("validate")
        .arg("--collection")
        .arg(&collection)
        .arg("--config")
        .arg(&config)
        .arg("--pairing")
        .arg("strict");
    let out = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(out).unwrap();
    assert!(stdout.contains("pairs: 0"));
    assert!(stdout.contains("warnings:"));
    assert_eq!(stdout.matches("stage2_empty_pairing").count(), 1);
    assert!(!stdout.contains("pairing produced zero pairs"));
}

#[test]
fn validate_fails_on_misaligned_annotations() {
    let tmp = TempDir::new().unwrap();
    let collection = tmp.path().join("train");
    write_collection(&collection, true);
    fs::write(collection.join("annotations/original.txt"), "o2 0\no1 0\no3 1\n").unwrap();

    let mut cmd = Command::cargo_bin("kira-karyotype").unwrap();
    cmd.arg("validate").arg("--collection").arg(&collection);
    cmd.assert().failure();
}

#[test]
fn evaluate_writes_report_metrics_and_predictions() {
    let tmp = TempDir::new().unwrap();
    let collection = tmp.path().join("val");
    write_collection(&collection, true);
    let config = write_config(tmp.path());
    let out_dir = tmp.path().join("out");
    let runs = tmp.path().join("runs");

    let mut cmd = Command::cargo_bin("kira-karyotype").unwrap();
    cmd.arg("evaluate")
        .arg("--collection")
        .arg(&collection)
        .arg("--config")
        .arg(&config)
        .arg("--out")
        .arg(&out_dir)
        .arg("--json")
        .arg("--tsv")
        .arg("--snapshot-root")
        .arg(&runs)
        .arg("--run-id")
        .arg("1");
    cmd.assert().success();

    let report: Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("report.json")).unwrap()).unwrap();
    assert_eq!(report["tool"], "kira-karyotype");
    assert_eq!(report["schema_version"], "v1");
    assert_eq!(report["input_meta"]["pairs"], 4);
    assert_eq!(report["input_meta"]["pairing"], "loose");
    assert_eq!(report["metrics"]["samples"], 4);
    assert_eq!(report["metrics"]["per_class"][2]["f1_score"], 0.0);
    assert_eq!(report["inference"]["batches"], 2);

    let metrics = fs::read_to_string(out_dir.join("metrics.tsv")).unwrap();
    assert_eq!(metrics.lines().count(), 5);
    assert!(metrics.lines().last().unwrap().starts_with("overall\t4"));

    let predictions = fs::read_to_string(out_dir.join("predictions.tsv")).unwrap();
    assert_eq!(predictions.lines().count(), 5);

    let run_dir = runs.join("models/val/small/run_1");
    let mut snapshots: Vec<String> = fs::read_dir(&run_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    snapshots.sort();
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots[0].starts_with("best_epoch0_"));
    assert!(snapshots[1].starts_with("checkpoint_epoch0_"));
    assert_eq!(&snapshots[0]["best".len()..], &snapshots[1]["checkpoint".len()..]);

    // The snapshot holds the weights that produced the predictions.
    let saved: Value =
        serde_json::from_str(&fs::read_to_string(run_dir.join(&snapshots[1])).unwrap()).unwrap();
    assert_eq!(saved["head"]["out_dim"], 3);
}

fn evaluate_into_run(
    collection: &Path,
    config: &Path,
    out_dir: &Path,
    runs: &Path,
    overwrite: bool,
) -> Command {
    let mut cmd = Command::cargo_bin("kira-karyotype").unwrap();
    cmd.arg("evaluate")
        .arg("--collection")
        .arg(collection)
        .arg("--config")
        .arg(config)
        .arg("--out")
        .arg(out_dir)
        .arg("--snapshot-root")
        .arg(runs)
        .arg("--run-id")
        .arg("2");
    if overwrite {
        cmd.arg("--overwrite");
    }
    cmd
}

#[test]
fn evaluate_snapshot_refuses_existing_run_unless_overwrite() {
    let tmp = TempDir::new().unwrap();
    let collection = tmp.path().join("val");
    write_collection(&collection, true);
    let config = write_config(tmp.path());
    let out_dir = tmp.path().join("out");
    let runs = tmp.path().join("runs");
    let run_dir = runs.join("models/val/small/run_2");

    evaluate_into_run(&collection, &config, &out_dir, &runs, false)
        .assert()
        .success();
    fs::write(run_dir.join("stale.pth"), "{}").unwrap();

    evaluate_into_run(&collection, &config, &out_dir, &runs, false)
        .assert()
        .failure();
    assert!(run_dir.join("stale.pth").exists());

    evaluate_into_run(&collection, &config, &out_dir, &runs, true)
        .assert()
        .success();
    assert!(!run_dir.join("stale.pth").exists());
    assert_eq!(fs::read_dir(&run_dir).unwrap().count(), 2);
}

#[test]
fn predict_pairs_positionally_without_labels() {
    let tmp = TempDir::new().unwrap();
    let collection = tmp.path().join("test");
    write_collection(&collection, false);
    let config = write_config(tmp.path());
    let out_dir = tmp.path().join("out");

    let mut cmd = Command::cargo_bin("kira-karyotype").unwrap();
    cmd.arg("predict")
        .arg("--collection")
        .arg(&collection)
        .arg("--config")
        .arg(&config)
        .arg("--out")
        .arg(&out_dir);
    cmd.assert().success();

    let predictions = fs::read_to_string(out_dir.join("predictions.tsv")).unwrap();
    let rows: Vec<&str> = predictions.lines().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("o1.png\th1_hp.png\t"));
    assert!(rows.iter().all(|r| r.ends_with('\t')));
}

#[test]
fn predict_with_unknown_table_id_fails() {
    let tmp = TempDir::new().unwrap();
    let collection = tmp.path().join("test");
    write_collection(&collection, false);
    let table = tmp.path().join("pairs.txt");
    fs::write(&table, "o1 h9_hp\n").unwrap();

    let mut cmd = Command::cargo_bin("kira-karyotype").unwrap();
    cmd.arg("predict")
        .arg("--collection")
        .arg(&collection)
        .arg("--out")
        .arg(tmp.path().join("out"))
        .arg("--pair-table")
        .arg(&table);
    cmd.assert().failure();
}

#[test]
fn metrics_command_from_tsv() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("preds.tsv");
    fs::write(&input, "predicted\ttruth\n0\t0\n1\t0\n1\t1\n").unwrap();
    let out_dir = tmp.path().join("m");

    let mut cmd = Command::cargo_bin("kira-karyotype").unwrap();
    cmd.arg("metrics")
        .arg("--predictions")
        .arg(&input)
        .arg("--out")
        .arg(&out_dir)
        .arg("--cls-num")
        .arg("2");
    cmd.assert().success();

    let json: Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("metrics.json")).unwrap()).unwrap();
    assert_eq!(
        json["overall"]["confusion_matrix"],
        serde_json::json!([[1, 1], [0, 1]])
    );
    assert_eq!(json["per_class"][0]["name"], "chr_1");

    let tsv = fs::read_to_string(out_dir.join("metrics.tsv")).unwrap();
    assert_eq!(tsv.lines().count(), 4);
}
