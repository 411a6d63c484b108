pub mod augment;
pub mod decode;

use image::RgbImage;
use ndarray::Array3;
use rand::Rng;
use tracing::info;

use crate::config::{AugParams, ExperimentConfig, Normalize};
use crate::error::{DataError, DataResult};
use crate::pairing::PairedSample;
use crate::sampling::ClassWeightTable;

/// Label carried by a loaded sample. Unlabeled test samples carry `Absent`,
/// which is distinct from a one-hot for class 0.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    OneHot(Vec<f32>),
    Absent,
}

impl Target {
    pub fn one_hot(label: usize, cls_num: usize) -> DataResult<Self> {
        if label >= cls_num {
            return Err(DataError::InvalidLabel(format!(
                "label {} outside [0, {})",
                label, cls_num
            )));
        }
        let mut v = vec![0.0f32; cls_num];
        v[label] = 1.0;
        Ok(Self::OneHot(v))
    }

    pub fn class(&self) -> Option<usize> {
        match self {
            Self::OneHot(v) => argmax(v),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

#[derive(Debug, Clone)]
pub struct PairedItem {
    pub original: Array3<f32>,
    pub highpass: Array3<f32>,
    pub target: Target,
    pub names: (String, String),
}

#[derive(Debug, Clone)]
pub struct PairedDataset {
    pairs: Vec<PairedSample>,
    cls_num: usize,
    aug: Option<AugParams>,
    normalize: Normalize,
    test: bool,
}

impl PairedDataset {
    pub fn new(
        pairs: Vec<PairedSample>,
        config: &ExperimentConfig,
        aug: Option<&AugParams>,
        test: bool,
    ) -> DataResult<Self> {
        if !test {
            for (i, pair) in pairs.iter().enumerate() {
                match pair.label {
                    Some(label) if label < config.cls_num => {}
                    Some(label) => {
                        return Err(DataError::InvalidLabel(format!(
                            "pair {} has label {} outside [0, {})",
                            i, label, config.cls_num
                        )));
                    }
                    None => {
                        return Err(DataError::InvalidLabel(format!(
                            "pair {} is unlabeled in a labeled dataset",
                            i
                        )));
                    }
                }
            }
        }
        Ok(Self {
            pairs,
            cls_num: config.cls_num,
            aug: aug.cloned(),
            normalize: config.normalize.clone(),
            test,
        })
    }

    pub fn size(&self) -> usize {
        self.pairs.len()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn is_test(&self) -> bool {
        self.test
    }

    pub fn cls_num(&self) -> usize {
        self.cls_num
    }

    pub fn pairs(&self) -> &[PairedSample] {
        &self.pairs
    }

    pub fn labels(&self) -> Vec<usize> {
        if self.test {
            return Vec::new();
        }
        self.pairs.iter().filter_map(|p| p.label).collect()
    }

    pub fn get<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> DataResult<PairedItem> {
        let pair = self.pairs.get(index).ok_or(DataError::OutOfRange {
            index,
            len: self.pairs.len(),
        })?;

        let original = self.load_one(&pair.original.path, rng)?;
        let highpass = self.load_one(&pair.highpass.path, rng)?;

        let target = match (self.test, pair.label) {
            (false, Some(label)) => Target::one_hot(label, self.cls_num)?,
            _ => Target::Absent,
        };

        Ok(PairedItem {
            original,
            highpass,
            target,
            names: (pair.original.file_name(), pair.highpass.file_name()),
        })
    }

    /// Per-class counts over the pair list (not the per-modality indices).
    pub fn label_statistic(&self) -> Vec<u64> {
        let mut counts = vec![0u64; self.cls_num];
        for label in self.labels() {
            counts[label] += 1;
        }
        for (i, count) in counts.iter().enumerate() {
            info!(class = i + 1, count = *count, "label_statistic");
        }
        info!(total = counts.iter().sum::<u64>(), "label_statistic_summary");
        counts
    }

    pub fn label_weights_for_balance(&self, constant: f64) -> DataResult<Vec<f64>> {
        let labels = self.labels();
        ClassWeightTable::from_labels(&labels, self.cls_num, constant)?.sample_weights(&labels)
    }

    fn load_one<R: Rng + ?Sized>(
        &self,
        path: &std::path::Path,
        rng: &mut R,
    ) -> DataResult<Array3<f32>> {
        let mut img = decode::load_rgb8(path)?;
        if let Some(params) = &self.aug {
            img = augment::augment(img, params, rng);
        }
        Ok(to_chw_tensor(&img, &self.normalize))
    }
}

pub fn to_chw_tensor(img: &RgbImage, norm: &Normalize) -> Array3<f32> {
    let (w, h) = img.dimensions();
    let mut out = Array3::<f32>::zeros((3, h as usize, w as usize));
    for (x, y, p) in img.enumerate_pixels() {
        for c in 0..3 {
            let v = f32::from(p[c]) / 255.0;
            out[[c, y as usize, x as usize]] = (v - norm.mean[c]) / norm.std[c];
        }
    }
    out
}

pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
