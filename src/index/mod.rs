pub mod manifest;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DataError, DataResult};
use manifest::{head_matches_id, read_annotations, read_manifest, resolve_list_file};

pub const IMAGE_DATA_DIR: &str = "ImageData";
pub const IMAGE_SETS_DIR: &str = "ImageSets";
pub const ANNOTATIONS_DIR: &str = "annotations";
pub const IMAGE_EXT: &str = "png";
const HIGHPASS_SUFFIX: &str = "_hp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Original,
    Highpass,
}

impl Modality {
    pub fn name(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Highpass => "highpass",
        }
    }

    pub fn subfolder(self) -> &'static str {
        match self {
            Self::Original => "original-image",
            Self::Highpass => "highpass-image",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub sample_id: String,
    pub label: Option<usize>,
}

impl ImageRecord {
    pub fn id(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ModalityIndex {
    pub modality: Modality,
    pub records: Vec<ImageRecord>,
}

impl ModalityIndex {
    pub fn new(modality: Modality, records: Vec<ImageRecord>) -> Self {
        Self { modality, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_labeled(&self) -> bool {
        self.records.iter().all(|r| r.label.is_some())
    }

    pub fn extend(&mut self, other: ModalityIndex) {
        self.records.extend(other.records);
    }
}

pub fn manifest_path(collection: &Path, modality: Modality) -> PathBuf {
    resolve_list_file(&collection.join(IMAGE_SETS_DIR), modality.name())
}

pub fn annotation_path(collection: &Path, modality: Modality) -> PathBuf {
    resolve_list_file(&collection.join(ANNOTATIONS_DIR), modality.name())
}

pub fn image_path(collection: &Path, modality: Modality, id: &str) -> PathBuf {
    collection
        .join(IMAGE_DATA_DIR)
        .join(modality.subfolder())
        .join(format!("{}.{}", id, IMAGE_EXT))
}

/// Join key across modalities: the file stem without a trailing `_hp`.
pub fn sample_id_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match stem.strip_suffix(HIGHPASS_SUFFIX) {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => stem,
    }
}

pub fn load_modality_index(
    collection: &Path,
    modality: Modality,
    with_labels: bool,
    cls_num: usize,
) -> DataResult<ModalityIndex> {
    let manifest = manifest_path(collection, modality);
    let ids = read_manifest(&manifest)?;

    let labels: Vec<Option<usize>> = if with_labels {
        let annotations_file = annotation_path(collection, modality);
        let annotations = read_annotations(&annotations_file, cls_num)?;
        if annotations.len() != ids.len() {
            return Err(DataError::malformed(
                &annotations_file,
                format!(
                    "{} annotation lines vs {} manifest lines in {}",
                    annotations.len(),
                    ids.len(),
                    manifest.display()
                ),
            ));
        }
        for (pos, (id, ann)) in ids.iter().zip(annotations.iter()).enumerate() {
            if !head_matches_id(&ann.head, id) {
                return Err(DataError::malformed(
                    &annotations_file,
                    format!(
                        "line {}: id '{}' does not match manifest entry {} '{}'",
                        ann.line_no,
                        ann.head,
                        pos + 1,
                        id
                    ),
                ));
            }
        }
        annotations.into_iter().map(|a| Some(a.label)).collect()
    } else {
        vec![None; ids.len()]
    };

    let records = ids
        .iter()
        .zip(labels)
        .map(|(id, label)| {
            let path = image_path(collection, modality, id);
            let sample_id = sample_id_from_path(&path);
            ImageRecord {
                path,
                sample_id,
                label,
            }
        })
        .collect::<Vec<_>>();

    info!(
        collection = %collection.display(),
        modality = modality.name(),
        records = records.len(),
        labeled = with_labels,
        "modality_index_loaded"
    );

    Ok(ModalityIndex::new(modality, records))
}

pub fn load_with_synthetic(
    collection: &Path,
    syn_collection: Option<&Path>,
    modality: Modality,
    with_labels: bool,
    cls_num: usize,
) -> DataResult<ModalityIndex> {
    let mut index = load_modality_index(collection, modality, with_labels, cls_num)?;
    if let Some(syn) = syn_collection {
        let extra = load_modality_index(syn, modality, with_labels, cls_num)?;
        info!(
            modality = modality.name(),
            synthetic = extra.len(),
            "synthetic_records_merged"
        );
        index.extend(extra);
    }
    Ok(index)
}
