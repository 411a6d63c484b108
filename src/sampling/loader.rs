use anyhow::Result;
use ndarray::{Array4, s};

#[cfg(feature = "mt")]
use rayon::prelude::*;

use crate::dataset::{PairedDataset, PairedItem, Target};
use crate::error::{DataError, DataResult};
use crate::sampling::sample_rng;

#[derive(Debug, Clone)]
pub struct Batch {
    pub original: Array4<f32>,
    pub highpass: Array4<f32>,
    pub targets: Vec<Target>,
    pub names: Vec<(String, String)>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Pulls samples from a shared dataset in fixed-size batches. With the `mt`
/// feature and `threads != 1`, samples of a batch are decoded in parallel.
pub struct BatchLoader<'a> {
    dataset: &'a PairedDataset,
    batch_size: usize,
    seed: u64,
    #[cfg(feature = "mt")]
    pool: Option<rayon::ThreadPool>,
}

impl<'a> BatchLoader<'a> {
    pub fn new(
        dataset: &'a PairedDataset,
        batch_size: usize,
        seed: u64,
        threads: usize,
    ) -> Result<Self> {
        if batch_size == 0 {
            anyhow::bail!("batch_size must be positive");
        }

        #[cfg(feature = "mt")]
        let pool = if threads == 1 {
            None
        } else {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| anyhow::anyhow!("failed to build loader pool: {}", e))?,
            )
        };
        #[cfg(not(feature = "mt"))]
        let _ = threads;

        Ok(Self {
            dataset,
            batch_size,
            seed,
            #[cfg(feature = "mt")]
            pool,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_batches(&self, order_len: usize) -> usize {
        order_len.div_ceil(self.batch_size)
    }

    pub fn batches<'b>(
        &'b self,
        order: &'b [usize],
        epoch: u64,
    ) -> impl Iterator<Item = DataResult<Batch>> + 'b {
        order
            .chunks(self.batch_size)
            .enumerate()
            .map(move |(b, chunk)| self.load_batch(chunk, epoch, (b * self.batch_size) as u64))
    }

    pub fn load_batch(&self, indices: &[usize], epoch: u64, first_position: u64) -> DataResult<Batch> {
        let items = self.load_items(indices, epoch, first_position)?;
        collate(items)
    }

    fn load_items(
        &self,
        indices: &[usize],
        epoch: u64,
        first_position: u64,
    ) -> DataResult<Vec<PairedItem>> {
        let dataset = self.dataset;
        let seed = self.seed;
        let load = move |k: usize, index: usize| {
            let mut rng = sample_rng(seed, epoch, first_position + k as u64);
            dataset.get(index, &mut rng)
        };

        #[cfg(feature = "mt")]
        {
            if let Some(pool) = &self.pool {
                return pool.install(|| {
                    indices
                        .par_iter()
                        .enumerate()
                        .map(|(k, &index)| load(k, index))
                        .collect()
                });
            }
        }

        indices
            .iter()
            .enumerate()
            .map(|(k, &index)| load(k, index))
            .collect()
    }
}

pub fn collate(items: Vec<PairedItem>) -> DataResult<Batch> {
    let first = items
        .first()
        .ok_or_else(|| DataError::ShapeMismatch("cannot collate an empty batch".to_string()))?;
    let o_dim = first.original.dim();
    let h_dim = first.highpass.dim();

    let n = items.len();
    let mut original = Array4::<f32>::zeros((n, o_dim.0, o_dim.1, o_dim.2));
    let mut highpass = Array4::<f32>::zeros((n, h_dim.0, h_dim.1, h_dim.2));
    let mut targets = Vec::with_capacity(n);
    let mut names = Vec::with_capacity(n);

    for (k, item) in items.into_iter().enumerate() {
        if item.original.dim() != o_dim || item.highpass.dim() != h_dim {
            return Err(DataError::ShapeMismatch(format!(
                "sample {} ({}, {}) has shape {:?}/{:?}, batch expects {:?}/{:?}",
                k,
                item.names.0,
                item.names.1,
                item.original.dim(),
                item.highpass.dim(),
                o_dim,
                h_dim
            )));
        }
        original.slice_mut(s![k, .., .., ..]).assign(&item.original);
        highpass.slice_mut(s![k, .., .., ..]).assign(&item.highpass);
        targets.push(item.target);
        names.push(item.names);
    }

    Ok(Batch {
        original,
        highpass,
        targets,
        names,
    })
}
