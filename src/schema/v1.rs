use serde::{Deserialize, Serialize};

use crate::eval::MetricsReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Validate,
    Evaluate,
    Predict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputMeta {
    pub collection: String,
    pub syn_collection: Option<String>,
    pub kind: RunKind,
    pub pairing: String,
    pub original_images: u64,
    pub highpass_images: u64,
    pub pairs: u64,
    pub cls_num: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassCount {
    pub name: String,
    pub original: u64,
    pub highpass: u64,
    pub pairs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingSummary {
    pub balance_constant: f64,
    pub samples_num: u64,
    pub drawn_per_class: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceSummary {
    pub batches: u64,
    pub samples: u64,
    pub mean_loss: Option<f64>,
    pub predictions_tsv_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KaryotypeV1 {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub input_meta: InputMeta,
    pub label_statistic: Vec<ClassCount>,
    pub sampling: Option<SamplingSummary>,
    pub inference: Option<InferenceSummary>,
    pub metrics: Option<MetricsReport>,
    pub warnings: Vec<String>,
}

impl KaryotypeV1 {
    pub fn empty(tool_version: &str, kind: RunKind, collection: &str, cls_num: usize) -> Self {
        Self {
            tool: "kira-karyotype".to_string(),
            version: tool_version.to_string(),
            schema_version: "v1".to_string(),
            input_meta: InputMeta {
                collection: collection.to_string(),
                syn_collection: None,
                kind,
                pairing: String::new(),
                original_images: 0,
                highpass_images: 0,
                pairs: 0,
                cls_num: cls_num as u64,
            },
            label_statistic: Vec::new(),
            sampling: None,
            inference: None,
            metrics: None,
            warnings: Vec::new(),
        }
    }
}
