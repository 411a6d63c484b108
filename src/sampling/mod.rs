pub mod loader;

use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use serde::Serialize;

use crate::error::{DataError, DataResult};

pub use loader::{Batch, BatchLoader, collate};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassWeightTable {
    pub constant: f64,
    weights: Vec<Option<f64>>,
}

impl ClassWeightTable {
    pub fn from_counts(counts: &[u64], constant: f64) -> Self {
        let weights = counts
            .iter()
            .map(|&n| {
                if n == 0 {
                    None
                } else {
                    Some(constant / n as f64)
                }
            })
            .collect();
        Self { constant, weights }
    }

    pub fn from_labels(labels: &[usize], cls_num: usize, constant: f64) -> DataResult<Self> {
        Ok(Self::from_counts(&class_counts(labels, cls_num)?, constant))
    }

    pub fn weight(&self, label: usize) -> Option<f64> {
        self.weights.get(label).copied().flatten()
    }

    pub fn weights(&self) -> &[Option<f64>] {
        &self.weights
    }

    pub fn sample_weights(&self, labels: &[usize]) -> DataResult<Vec<f64>> {
        labels
            .iter()
            .map(|&label| {
                self.weight(label).ok_or_else(|| {
                    DataError::InvalidLabel(format!("no weight for absent class {}", label))
                })
            })
            .collect()
    }
}

pub fn class_counts(labels: &[usize], cls_num: usize) -> DataResult<Vec<u64>> {
    let mut counts = vec![0u64; cls_num];
    for &label in labels {
        let slot = counts.get_mut(label).ok_or_else(|| {
            DataError::InvalidLabel(format!("label {} outside [0, {})", label, cls_num))
        })?;
        *slot += 1;
    }
    Ok(counts)
}

#[derive(Debug, Clone)]
pub struct BalancedSampler {
    dist: WeightedIndex<f64>,
    num_samples: usize,
    seed: u64,
}

impl BalancedSampler {
    pub fn new(weights: &[f64], num_samples: usize, seed: u64) -> DataResult<Self> {
        let dist = WeightedIndex::new(weights)
            .map_err(|e| DataError::InvalidLabel(format!("invalid sampling weights: {}", e)))?;
        Ok(Self {
            dist,
            num_samples,
            seed,
        })
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// One epoch's draw. Same `(seed, epoch)` gives the same indices.
    pub fn draw(&self, epoch: u64) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(mix_seed(self.seed, epoch, u64::MAX));
        (0..self.num_samples)
            .map(|_| self.dist.sample(&mut rng))
            .collect()
    }
}

pub fn drawn_histogram(drawn: &[usize], labels: &[usize], cls_num: usize) -> DataResult<Vec<u64>> {
    let mut hist = vec![0u64; cls_num];
    for &i in drawn {
        let label = *labels.get(i).ok_or(DataError::OutOfRange {
            index: i,
            len: labels.len(),
        })?;
        let slot = hist.get_mut(label).ok_or_else(|| {
            DataError::InvalidLabel(format!("label {} outside [0, {})", label, cls_num))
        })?;
        *slot += 1;
    }
    Ok(hist)
}

pub fn sample_rng(seed: u64, epoch: u64, position: u64) -> StdRng {
    StdRng::seed_from_u64(mix_seed(seed, epoch, position))
}

pub fn mix_seed(seed: u64, epoch: u64, position: u64) -> u64 {
    let mut x = splitmix64(seed);
    x = splitmix64(x ^ epoch);
    splitmix64(x ^ position)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}
