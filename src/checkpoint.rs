use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::model::FusionWeights;

/// Where one training run keeps its snapshots:
/// `<root>/models/<val_collection_name>/<config_name>/run_<run_id>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    dir: PathBuf,
}

impl RunLayout {
    pub fn new(root: &Path, val_collection: &Path, config_name: &str, run_id: u32) -> Self {
        let val_name = val_collection
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = root
            .join("models")
            .join(val_name)
            .join(config_name)
            .join(format!("run_{}", run_id));
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates a fresh run directory. An existing one is removed when
    /// `overwrite` is set and refused otherwise.
    pub fn prepare(&self, overwrite: bool) -> Result<()> {
        if self.dir.exists() {
            if !overwrite {
                bail!("run directory {} already exists", self.dir.display());
            }
            std::fs::remove_dir_all(&self.dir)
                .with_context(|| format!("failed to clear {}", self.dir.display()))?;
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        info!(dir = %self.dir.display(), "run_dir_ready");
        Ok(())
    }

    pub fn checkpoint_path(&self, epoch: usize, metric: f64) -> PathBuf {
        self.dir.join(checkpoint_file_name(epoch, metric))
    }

    pub fn best_path(&self, epoch: usize, metric: f64) -> PathBuf {
        self.dir.join(best_file_name(epoch, metric))
    }

    pub fn save_weights(&self, weights: &FusionWeights, path: &Path) -> Result<()> {
        if !path.starts_with(&self.dir) {
            bail!("{} is outside run directory {}", path.display(), self.dir.display());
        }
        weights.save(path)?;
        info!(path = %path.display(), "weights_saved");
        Ok(())
    }
}

pub fn checkpoint_file_name(epoch: usize, metric: f64) -> String {
    format!("checkpoint_epoch{}_{:.4}.pth", epoch, metric)
}

pub fn best_file_name(epoch: usize, metric: f64) -> String {
    format!("best_epoch{}_{:.4}.pth", epoch, metric)
}
