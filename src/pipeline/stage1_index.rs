use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::error::DataError;
use crate::index::{Modality, ModalityIndex, load_with_synthetic};
use crate::pipeline::Stage;
use crate::schema::v1::RunKind;

pub struct Stage1Index;

impl Stage1Index {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Index {
    fn name(&self) -> &'static str {
        "stage1_index"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let with_labels = ctx.is_labeled();
        let cls_num = ctx.config.cls_num;
        let syn = ctx.syn_collection.as_deref();

        let original =
            load_with_synthetic(&ctx.collection, syn, Modality::Original, with_labels, cls_num)?;
        let highpass =
            load_with_synthetic(&ctx.collection, syn, Modality::Highpass, with_labels, cls_num)?;

        if matches!(ctx.kind, RunKind::Validate) {
            check_images_exist(&original)?;
            check_images_exist(&highpass)?;
        }

        ctx.report.input_meta.original_images = original.len() as u64;
        ctx.report.input_meta.highpass_images = highpass.len() as u64;
        info!(
            original = original.len(),
            highpass = highpass.len(),
            labeled = with_labels,
            "stage1_index_ready"
        );

        ctx.original = Some(original);
        ctx.highpass = Some(highpass);
        Ok(())
    }
}

fn check_images_exist(index: &ModalityIndex) -> Result<()> {
    for rec in &index.records {
        if !rec.path.is_file() {
            return Err(DataError::MissingFile(rec.path.clone()).into());
        }
    }
    Ok(())
}
