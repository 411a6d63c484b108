use ndarray::{Array2, ArrayView4};
use rand::Rng;

use crate::error::{DataError, DataResult};
use crate::model::Linear;
use crate::model::weights::BackboneWeights;

pub trait Backbone: Send + Sync {
    fn feature_dim(&self) -> usize;

    /// NCHW in, `[batch, feature_dim]` out.
    fn extract(&self, batch: ArrayView4<f32>) -> DataResult<Array2<f32>>;

    fn to_weights(&self) -> Option<BackboneWeights> {
        None
    }
}

pub const CHANNELS: usize = 3;

/// Average-pools each channel over a `grid x grid` partition of the image and
/// projects the pooled vector through a ReLU layer.
#[derive(Debug, Clone)]
pub struct GridPoolBackbone {
    grid: usize,
    proj: Linear,
}

impl GridPoolBackbone {
    pub fn random<R: Rng + ?Sized>(grid: usize, feature_dim: usize, rng: &mut R) -> Self {
        let grid = grid.max(1);
        Self {
            grid,
            proj: Linear::random(CHANNELS * grid * grid, feature_dim, rng),
        }
    }

    pub fn from_weights(w: &BackboneWeights) -> DataResult<Self> {
        let proj = Linear::from_weights(&w.proj)?;
        if w.grid == 0 || proj.in_dim() != CHANNELS * w.grid * w.grid {
            return Err(DataError::ShapeMismatch(format!(
                "backbone grid {} does not fit projection input {}",
                w.grid,
                proj.in_dim()
            )));
        }
        Ok(Self { grid: w.grid, proj })
    }

    pub fn weights(&self) -> BackboneWeights {
        BackboneWeights {
            grid: self.grid,
            proj: self.proj.to_weights(),
        }
    }

    fn pool(&self, batch: &ArrayView4<f32>) -> DataResult<Array2<f32>> {
        let (n, c, h, w) = batch.dim();
        if c != CHANNELS {
            return Err(DataError::ShapeMismatch(format!(
                "backbone expects {} channels, got {}",
                CHANNELS, c
            )));
        }
        if h == 0 || w == 0 {
            return Err(DataError::ShapeMismatch("empty spatial extent".to_string()));
        }
        let g = self.grid;
        let mut pooled = Array2::<f32>::zeros((n, c * g * g));
        for b in 0..n {
            for ch in 0..c {
                for gy in 0..g {
                    let (y0, y1) = cell_bounds(gy, g, h);
                    for gx in 0..g {
                        let (x0, x1) = cell_bounds(gx, g, w);
                        let mut sum = 0.0f32;
                        for y in y0..y1 {
                            for x in x0..x1 {
                                sum += batch[[b, ch, y, x]];
                            }
                        }
                        let area = ((y1 - y0) * (x1 - x0)) as f32;
                        pooled[[b, (ch * g + gy) * g + gx]] = sum / area;
                    }
                }
            }
        }
        Ok(pooled)
    }
}

impl Backbone for GridPoolBackbone {
    fn feature_dim(&self) -> usize {
        self.proj.out_dim()
    }

    fn extract(&self, batch: ArrayView4<f32>) -> DataResult<Array2<f32>> {
        let pooled = self.pool(&batch)?;
        let mut features = self.proj.forward(pooled.view())?;
        features.mapv_inplace(|v| v.max(0.0));
        Ok(features)
    }

    fn to_weights(&self) -> Option<BackboneWeights> {
        Some(self.weights())
    }
}

// Cells never come out empty: a short axis repeats its last row/column.
fn cell_bounds(i: usize, g: usize, extent: usize) -> (usize, usize) {
    let start = (i * extent / g).min(extent - 1);
    let end = ((i + 1) * extent / g).max(start + 1).min(extent);
    (start, end)
}
