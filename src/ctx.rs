use std::path::PathBuf;

use crate::config::ExperimentConfig;
use crate::dataset::PairedDataset;
use crate::eval::{BestTracker, MetricsReport};
use crate::index::ModalityIndex;
use crate::model::FusionWeights;
use crate::pairing::{PairPlan, PairedSample, PairingMode, TestPairing};
use crate::schema::v1::{KaryotypeV1, RunKind};

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub json_path: PathBuf,
    pub metrics_tsv_path: PathBuf,
    pub predictions_tsv_path: PathBuf,
}

impl OutputPaths {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            json_path: out_dir.join("report.json"),
            metrics_tsv_path: out_dir.join("metrics.tsv"),
            predictions_tsv_path: out_dir.join("predictions.tsv"),
            out_dir,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub original: String,
    pub highpass: String,
    pub label: usize,
    pub score: f32,
    pub truth: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SnapshotTarget {
    pub root: PathBuf,
    pub run_id: u32,
    pub epoch: usize,
    pub overwrite: bool,
}

#[derive(Debug)]
pub struct Ctx {
    pub collection: PathBuf,
    pub syn_collection: Option<PathBuf>,
    pub kind: RunKind,
    pub config: ExperimentConfig,
    pub pairing: PairingMode,
    pub test_pairing: TestPairing,
    pub samples_num: usize,
    pub threads: usize,
    pub seed: u64,
    pub write_json: bool,
    pub write_tsv: bool,
    pub snapshot: Option<SnapshotTarget>,
    pub warnings: Vec<String>,
    pub original: Option<ModalityIndex>,
    pub highpass: Option<ModalityIndex>,
    pub plan: Option<PairPlan>,
    pub pairs: Vec<PairedSample>,
    pub dataset: Option<PairedDataset>,
    pub label_counts: Vec<u64>,
    pub drawn_histogram: Option<Vec<u64>>,
    pub weights: Option<FusionWeights>,
    pub predictions: Vec<PredictionRow>,
    pub batches: u64,
    pub mean_loss: Option<f64>,
    pub metrics: Option<MetricsReport>,
    pub best: BestTracker,
    pub snapshot_paths: Vec<PathBuf>,
    pub output: OutputPaths,
    pub report: KaryotypeV1,
}

impl Ctx {
    pub fn new(
        collection: PathBuf,
        out_dir: PathBuf,
        kind: RunKind,
        config: ExperimentConfig,
        tool_version: &str,
    ) -> Self {
        let report = KaryotypeV1::empty(
            tool_version,
            kind,
            &collection.display().to_string(),
            config.cls_num,
        );
        let pairing = config.eval_pairing;
        let samples_num = config.train.samples_num;
        let seed = config.model.seed;
        Self {
            collection,
            syn_collection: None,
            kind,
            pairing,
            test_pairing: TestPairing::Positional,
            samples_num,
            threads: 0,
            seed,
            write_json: false,
            write_tsv: false,
            snapshot: None,
            warnings: Vec::new(),
            original: None,
            highpass: None,
            plan: None,
            pairs: Vec::new(),
            dataset: None,
            label_counts: Vec::new(),
            drawn_histogram: None,
            weights: None,
            predictions: Vec::new(),
            batches: 0,
            mean_loss: None,
            metrics: None,
            best: BestTracker::new(),
            snapshot_paths: Vec::new(),
            output: OutputPaths::new(out_dir),
            report,
            config,
        }
    }

    pub fn is_labeled(&self) -> bool {
        !matches!(self.kind, RunKind::Predict)
    }

    pub fn dataset(&self) -> anyhow::Result<&PairedDataset> {
        self.dataset
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("paired dataset not built"))
    }
}
