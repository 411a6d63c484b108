pub mod table;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DataError, DataResult};
use crate::index::{ImageRecord, ModalityIndex};

pub use table::{TestPairing, load_pair_table, test_pairs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMode {
    Strict,
    #[default]
    Loose,
}

impl fmt::Display for PairingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Loose => write!(f, "loose"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedSample {
    pub original: ImageRecord,
    pub highpass: ImageRecord,
    pub label: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassPairCount {
    pub class: usize,
    pub original: u64,
    pub highpass: u64,
    pub pairs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairPlan {
    pub mode: PairingMode,
    pub per_class: Vec<ClassPairCount>,
    pub total: u64,
}

pub fn plan_pairs(
    original: &ModalityIndex,
    highpass: &ModalityIndex,
    mode: PairingMode,
    cls_num: usize,
) -> DataResult<PairPlan> {
    let mut per_class: Vec<ClassPairCount> = (0..cls_num)
        .map(|class| ClassPairCount {
            class,
            original: 0,
            highpass: 0,
            pairs: 0,
        })
        .collect();

    for rec in &original.records {
        per_class[checked_label(rec, cls_num)?].original += 1;
    }
    for rec in &highpass.records {
        per_class[checked_label(rec, cls_num)?].highpass += 1;
    }

    match mode {
        PairingMode::Loose => {
            for c in per_class.iter_mut() {
                c.pairs = c.original * c.highpass;
            }
        }
        PairingMode::Strict => {
            let mut by_id: HashMap<&str, u64> = HashMap::new();
            for rec in &highpass.records {
                *by_id.entry(rec.sample_id.as_str()).or_insert(0) += 1;
            }
            for rec in &original.records {
                if let Some(&n) = by_id.get(rec.sample_id.as_str()) {
                    per_class[checked_label(rec, cls_num)?].pairs += n;
                }
            }
        }
    }

    let total = per_class.iter().map(|c| c.pairs).sum();
    Ok(PairPlan {
        mode,
        per_class,
        total,
    })
}

/// Plans, checks the plan against `budget`, then materializes the pairs in
/// original-major, highpass-minor order.
pub fn sample_pairs(
    original: &ModalityIndex,
    highpass: &ModalityIndex,
    mode: PairingMode,
    cls_num: usize,
    budget: u64,
) -> DataResult<(PairPlan, Vec<PairedSample>)> {
    let plan = plan_pairs(original, highpass, mode, cls_num)?;
    if plan.total > budget {
        return Err(DataError::PairBudgetExceeded {
            planned: plan.total,
            budget,
        });
    }

    let capacity = usize::try_from(plan.total).map_err(|_| DataError::PairBudgetExceeded {
        planned: plan.total,
        budget: usize::MAX as u64,
    })?;
    let mut pairs = Vec::with_capacity(capacity);

    match mode {
        PairingMode::Loose => {
            let mut by_class: Vec<Vec<&ImageRecord>> = vec![Vec::new(); cls_num];
            for rec in &highpass.records {
                by_class[checked_label(rec, cls_num)?].push(rec);
            }
            for orig in &original.records {
                let label = checked_label(orig, cls_num)?;
                for hp in &by_class[label] {
                    pairs.push(PairedSample {
                        original: orig.clone(),
                        highpass: (*hp).clone(),
                        label: Some(label),
                    });
                }
            }
        }
        PairingMode::Strict => {
            let mut by_id: HashMap<&str, Vec<&ImageRecord>> = HashMap::new();
            for rec in &highpass.records {
                by_id.entry(rec.sample_id.as_str()).or_default().push(rec);
            }
            for orig in &original.records {
                let label = checked_label(orig, cls_num)?;
                if let Some(matches) = by_id.get(orig.sample_id.as_str()) {
                    for hp in matches {
                        pairs.push(PairedSample {
                            original: orig.clone(),
                            highpass: (*hp).clone(),
                            label: Some(label),
                        });
                    }
                }
            }
        }
    }

    info!(mode = %mode, pairs = pairs.len(), "pairs_materialized");
    Ok((plan, pairs))
}

fn checked_label(rec: &ImageRecord, cls_num: usize) -> DataResult<usize> {
    match rec.label {
        Some(label) if label < cls_num => Ok(label),
        Some(label) => Err(DataError::InvalidLabel(format!(
            "{} has label {} outside [0, {})",
            rec.path.display(),
            label,
            cls_num
        ))),
        None => Err(DataError::InvalidLabel(format!(
            "{} has no label; labeled pairing requires annotations",
            rec.path.display()
        ))),
    }
}
