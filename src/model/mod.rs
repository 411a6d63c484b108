pub mod backbone;
pub mod weights;

use ndarray::{Array1, Array2, ArrayView2, ArrayView4, Axis, concatenate};
use rand::Rng;
use serde::Serialize;

use crate::error::{DataError, DataResult};

pub use backbone::{Backbone, GridPoolBackbone};
pub use weights::{DenseWeights, FusionWeights};

/// Fully connected layer, `y = x W^T + b`.
#[derive(Debug, Clone)]
pub struct Linear {
    weight: Array2<f32>,
    bias: Array1<f32>,
}

impl Linear {
    pub fn random<R: Rng + ?Sized>(in_dim: usize, out_dim: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (in_dim + out_dim).max(1) as f32).sqrt();
        let weight = Array2::from_shape_fn((out_dim, in_dim), |_| rng.gen_range(-limit..=limit));
        Self {
            weight,
            bias: Array1::zeros(out_dim),
        }
    }

    pub fn from_weights(w: &DenseWeights) -> DataResult<Self> {
        let weight = Array2::from_shape_vec((w.out_dim, w.in_dim), w.weight.clone())
            .map_err(|e| DataError::ShapeMismatch(format!("dense weight: {}", e)))?;
        if w.bias.len() != w.out_dim {
            return Err(DataError::ShapeMismatch(format!(
                "dense bias has {} entries, expected {}",
                w.bias.len(),
                w.out_dim
            )));
        }
        Ok(Self {
            weight,
            bias: Array1::from_vec(w.bias.clone()),
        })
    }

    pub fn to_weights(&self) -> DenseWeights {
        DenseWeights {
            out_dim: self.out_dim(),
            in_dim: self.in_dim(),
            weight: self.weight.iter().copied().collect(),
            bias: self.bias.to_vec(),
        }
    }

    pub fn in_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_dim(&self) -> usize {
        self.weight.nrows()
    }

    pub fn forward(&self, x: ArrayView2<f32>) -> DataResult<Array2<f32>> {
        if x.ncols() != self.in_dim() {
            return Err(DataError::ShapeMismatch(format!(
                "linear input has {} features, expected {}",
                x.ncols(),
                self.in_dim()
            )));
        }
        Ok(x.dot(&self.weight.t()) + &self.bias)
    }
}

pub struct FusionNet {
    original: Box<dyn Backbone>,
    highpass: Box<dyn Backbone>,
    head: Linear,
}

impl FusionNet {
    pub fn new(
        original: Box<dyn Backbone>,
        highpass: Box<dyn Backbone>,
        head: Linear,
    ) -> DataResult<Self> {
        let fused = original.feature_dim() + highpass.feature_dim();
        if head.in_dim() != fused {
            return Err(DataError::ShapeMismatch(format!(
                "head expects {} features, backbones produce {}",
                head.in_dim(),
                fused
            )));
        }
        Ok(Self {
            original,
            highpass,
            head,
        })
    }

    pub fn from_weights(weights: &FusionWeights) -> DataResult<Self> {
        Self::new(
            Box::new(GridPoolBackbone::from_weights(&weights.original)?),
            Box::new(GridPoolBackbone::from_weights(&weights.highpass)?),
            Linear::from_weights(&weights.head)?,
        )
    }

    pub fn cls_num(&self) -> usize {
        self.head.out_dim()
    }

    /// `[batch, cls_num]` raw logits.
    pub fn infer(
        &self,
        original: ArrayView4<f32>,
        highpass: ArrayView4<f32>,
    ) -> DataResult<Array2<f32>> {
        let n = original.shape()[0];
        if highpass.shape()[0] != n {
            return Err(DataError::ShapeMismatch(format!(
                "branch batch sizes differ: {} vs {}",
                n,
                highpass.shape()[0]
            )));
        }
        let f_orig = self.original.extract(original)?;
        let f_hp = self.highpass.extract(highpass)?;
        let fused = concatenate(Axis(1), &[f_orig.view(), f_hp.view()])
            .map_err(|e| DataError::ShapeMismatch(format!("feature concat: {}", e)))?;
        self.head.forward(fused.view())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: usize,
    pub score: f32,
}

pub fn softmax_rows(logits: ArrayView2<f32>) -> Array2<f32> {
    let mut out = logits.to_owned();
    for mut row in out.rows_mut() {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum: f32 = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
    out
}

pub fn decode_predictions(logits: ArrayView2<f32>) -> Vec<Prediction> {
    let probs = softmax_rows(logits);
    probs
        .rows()
        .into_iter()
        .map(|row| {
            let mut label = 0usize;
            let mut score = f32::NEG_INFINITY;
            for (i, &p) in row.iter().enumerate() {
                if p > score {
                    label = i;
                    score = p;
                }
            }
            Prediction { label, score }
        })
        .collect()
}

pub fn cross_entropy(logits: ArrayView2<f32>, targets: &[usize]) -> DataResult<f32> {
    if logits.nrows() != targets.len() {
        return Err(DataError::ShapeMismatch(format!(
            "{} logit rows vs {} targets",
            logits.nrows(),
            targets.len()
        )));
    }
    if targets.is_empty() {
        return Ok(0.0);
    }
    let mut total = 0.0f32;
    for (row, &t) in logits.rows().into_iter().zip(targets) {
        let logit_t = *row.get(t).ok_or_else(|| {
            DataError::InvalidLabel(format!("target {} outside [0, {})", t, row.len()))
        })?;
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let lse = max + row.iter().map(|v| (v - max).exp()).sum::<f32>().ln();
        total += lse - logit_t;
    }
    Ok(total / targets.len() as f32)
}
