pub mod meter;

use serde::Serialize;

use crate::error::{DataError, DataResult};

pub use meter::{AverageMeter, BestTracker};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// `chr_<c+1>`
    pub name: String,
    pub class: usize,
    pub support: u64,
    pub sensitivity: f64,
    pub specificity: f64,
    pub f1_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallMetrics {
    pub accuracy: f64,
    pub macro_f1: f64,
    /// Rows are true classes, columns predicted classes.
    pub confusion_matrix: Vec<Vec<u64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub samples: u64,
    pub overall: OverallMetrics,
    pub per_class: Vec<ClassMetrics>,
}

impl MetricsReport {
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "accuracy" => Some(self.overall.accuracy),
            "f1_score" | "macro_f1" => Some(self.overall.macro_f1),
            _ => None,
        }
    }

    /// Classes present in the truth stream, best F1 first. Ties keep class order.
    pub fn ranked(&self) -> Vec<&ClassMetrics> {
        let mut out: Vec<&ClassMetrics> = self.per_class.iter().filter(|c| c.support > 0).collect();
        out.sort_by(|a, b| b.f1_score.total_cmp(&a.f1_score));
        out
    }
}

pub fn class_name(class: usize) -> String {
    format!("chr_{}", class + 1)
}

pub fn evaluate(predicted: &[usize], truth: &[usize], cls_num: usize) -> DataResult<MetricsReport> {
    let matrix = confusion_matrix(predicted, truth, cls_num)?;
    let total = truth.len() as u64;

    let per_class: Vec<ClassMetrics> = (0..cls_num)
        .map(|c| class_metrics(&binarize(predicted, c), &binarize(truth, c), c))
        .collect();

    let correct: u64 = (0..cls_num).map(|c| matrix[c][c]).sum();
    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    };
    let macro_f1 = if cls_num == 0 {
        0.0
    } else {
        per_class.iter().map(|c| c.f1_score).sum::<f64>() / cls_num as f64
    };

    Ok(MetricsReport {
        samples: total,
        overall: OverallMetrics {
            accuracy,
            macro_f1,
            confusion_matrix: matrix,
        },
        per_class,
    })
}

pub fn confusion_matrix(
    predicted: &[usize],
    truth: &[usize],
    cls_num: usize,
) -> DataResult<Vec<Vec<u64>>> {
    if predicted.len() != truth.len() {
        return Err(DataError::InvalidLabel(format!(
            "{} predictions vs {} truths",
            predicted.len(),
            truth.len()
        )));
    }
    let mut matrix = vec![vec![0u64; cls_num]; cls_num];
    for (i, (&p, &t)) in predicted.iter().zip(truth).enumerate() {
        if p >= cls_num || t >= cls_num {
            return Err(DataError::InvalidLabel(format!(
                "sample {}: predicted {} / truth {} outside [0, {})",
                i, p, t, cls_num
            )));
        }
        matrix[t][p] += 1;
    }
    Ok(matrix)
}

pub fn binarize(values: &[usize], class: usize) -> Vec<u8> {
    values.iter().map(|&v| u8::from(v == class)).collect()
}

fn class_metrics(predicted: &[u8], truth: &[u8], c: usize) -> ClassMetrics {
    let (mut tp, mut fn_, mut fp, mut tn) = (0u64, 0u64, 0u64, 0u64);
    for (&p, &t) in predicted.iter().zip(truth) {
        match (p, t) {
            (1, 1) => tp += 1,
            (0, 1) => fn_ += 1,
            (1, 0) => fp += 1,
            _ => tn += 1,
        }
    }
    let support = tp + fn_;

    // Class absent from the truth stream.
    if support == 0 {
        return ClassMetrics {
            name: class_name(c),
            class: c,
            support,
            sensitivity: 0.0,
            specificity: 0.0,
            f1_score: 0.0,
        };
    }

    let sensitivity = tp as f64 / (tp + fn_) as f64;
    let specificity = if tn + fp == 0 {
        0.0
    } else {
        tn as f64 / (tn + fp) as f64
    };
    let f1_score = if sensitivity + specificity == 0.0 {
        0.0
    } else {
        2.0 * sensitivity * specificity / (sensitivity + specificity)
    };

    ClassMetrics {
        name: class_name(c),
        class: c,
        support,
        sensitivity,
        specificity,
        f1_score,
    }
}
