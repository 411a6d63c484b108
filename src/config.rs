use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::pairing::PairingMode;

pub const DEFAULT_CLS_NUM: usize = 24;
pub const DEFAULT_BALANCE_CONSTANT: f64 = 100.0;
pub const DEFAULT_MAX_PAIRS: u64 = 5_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub name: String,
    pub cls_num: usize,
    pub train_pairing: PairingMode,
    pub eval_pairing: PairingMode,
    pub balance_constant: f64,
    pub max_pairs: u64,
    pub train: TrainParams,
    pub normalize: Normalize,
    pub aug_params: AugProfiles,
    pub model: ModelParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainParams {
    pub samples_num: usize,
    pub batch_size: usize,
    pub eval_batch_size: usize,
    pub print_freq: usize,
    pub max_epoch: usize,
    pub best_metric: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Normalize {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugProfiles {
    pub augmentation: AugParams,
    pub onlyresize: AugParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugParams {
    /// `[height, width]`
    pub output_shape: [u32; 2],
    pub keep_aspect_ratio: bool,
    pub rotation: bool,
    pub flip: bool,
    pub flip_prob: f32,
    pub brightness: bool,
    pub brightness_range: [f32; 2],
    pub contrast: bool,
    pub contrast_range: [f32; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub feature_dim: usize,
    pub pool_grid: usize,
    pub weights: Option<PathBuf>,
    pub seed: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: "config_chromosome".to_string(),
            cls_num: DEFAULT_CLS_NUM,
            train_pairing: PairingMode::Loose,
            eval_pairing: PairingMode::Loose,
            balance_constant: DEFAULT_BALANCE_CONSTANT,
            max_pairs: DEFAULT_MAX_PAIRS,
            train: TrainParams::default(),
            normalize: Normalize::default(),
            aug_params: AugProfiles::default(),
            model: ModelParams::default(),
        }
    }
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            samples_num: 2000,
            batch_size: 16,
            eval_batch_size: 1,
            print_freq: 10,
            max_epoch: 100,
            best_metric: "f1_score".to_string(),
        }
    }
}

impl Default for Normalize {
    fn default() -> Self {
        Self {
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

impl Default for AugProfiles {
    fn default() -> Self {
        Self {
            augmentation: AugParams {
                rotation: true,
                flip: true,
                brightness: true,
                contrast: true,
                ..AugParams::default()
            },
            onlyresize: AugParams::default(),
        }
    }
}

impl Default for AugParams {
    fn default() -> Self {
        Self {
            output_shape: [224, 224],
            keep_aspect_ratio: true,
            rotation: false,
            flip: false,
            flip_prob: 0.5,
            brightness: false,
            brightness_range: [0.8, 1.2],
            contrast: false,
            contrast_range: [0.8, 1.2],
        }
    }
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            feature_dim: 512,
            pool_grid: 4,
            weights: None,
            seed: 0,
        }
    }
}

impl ExperimentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cls_num == 0 {
            bail!("cls_num must be positive");
        }
        if !(self.balance_constant > 0.0) {
            bail!("balance_constant must be positive");
        }
        if self.train.batch_size == 0 || self.train.eval_batch_size == 0 {
            bail!("batch sizes must be positive");
        }
        if self.normalize.std.iter().any(|s| *s <= 0.0) {
            bail!("normalize.std entries must be positive");
        }
        for params in [&self.aug_params.augmentation, &self.aug_params.onlyresize] {
            if params.output_shape[0] == 0 || params.output_shape[1] == 0 {
                bail!("output_shape must be non-zero");
            }
            if params.brightness_range[0] > params.brightness_range[1]
                || params.contrast_range[0] > params.contrast_range[1]
            {
                bail!("augmentation ranges must be ordered [low, high]");
            }
        }
        if self.model.feature_dim == 0 || self.model.pool_grid == 0 {
            bail!("model.feature_dim and model.pool_grid must be positive");
        }
        Ok(())
    }
}
