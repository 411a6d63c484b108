use std::path::Path;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::ModelParams;
use crate::model::backbone::{Backbone, GridPoolBackbone};
use crate::model::{FusionNet, Linear};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseWeights {
    pub out_dim: usize,
    pub in_dim: usize,
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackboneWeights {
    pub grid: usize,
    pub proj: DenseWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub original: BackboneWeights,
    pub highpass: BackboneWeights,
    pub head: DenseWeights,
}

impl FusionWeights {
    pub fn random(params: &ModelParams, cls_num: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(params.seed);
        let original = GridPoolBackbone::random(params.pool_grid, params.feature_dim, &mut rng);
        let highpass = GridPoolBackbone::random(params.pool_grid, params.feature_dim, &mut rng);
        let head = Linear::random(params.feature_dim * 2, cls_num, &mut rng);
        Self {
            original: original.weights(),
            highpass: highpass.weights(),
            head: head.to_weights(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read weights {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse weights {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::io::write_json(path, self)
    }
}

impl FusionNet {
    /// Loads `params.weights` when set, otherwise initializes from `params.seed`.
    pub fn from_config(params: &ModelParams, cls_num: usize) -> Result<Self> {
        let weights = match &params.weights {
            Some(path) => FusionWeights::load(path)?,
            None => FusionWeights::random(params, cls_num),
        };
        let net = Self::from_weights(&weights)?;
        if net.cls_num() != cls_num {
            anyhow::bail!(
                "weights produce {} classes, config expects {}",
                net.cls_num(),
                cls_num
            );
        }
        Ok(net)
    }

    pub fn to_weights(&self) -> Result<FusionWeights> {
        let original = self
            .original
            .to_weights()
            .context("original backbone has no serializable weights")?;
        let highpass = self
            .highpass
            .to_weights()
            .context("highpass backbone has no serializable weights")?;
        Ok(FusionWeights {
            original,
            highpass,
            head: self.head.to_weights(),
        })
    }
}
