use anyhow::Result;
use tracing::info;

use crate::ctx::{Ctx, PredictionRow};
use crate::eval::AverageMeter;
use crate::model::{FusionNet, cross_entropy, decode_predictions};
use crate::pipeline::Stage;
use crate::sampling::BatchLoader;
use crate::schema::v1::InferenceSummary;

pub struct Stage5Inference;

impl Stage5Inference {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Inference {
    fn name(&self) -> &'static str {
        "stage5_inference"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let net = FusionNet::from_config(&ctx.config.model, ctx.config.cls_num)?;
        let dataset = ctx.dataset()?;
        let order: Vec<usize> = (0..dataset.len()).collect();
        let print_freq = ctx.config.train.print_freq.max(1);

        let mut rows = Vec::with_capacity(order.len());
        let mut loss_meter = AverageMeter::new();
        let mut batches = 0u64;
        {
            let loader =
                BatchLoader::new(dataset, ctx.config.train.eval_batch_size, ctx.seed, ctx.threads)?;
            let total = loader.num_batches(order.len());

            for (i, batch) in loader.batches(&order, 0).enumerate() {
                let batch = batch?;
                let logits = net.infer(batch.original.view(), batch.highpass.view())?;

                let truths: Vec<Option<usize>> = batch.targets.iter().map(|t| t.class()).collect();
                if !dataset.is_test() {
                    let classes: Vec<usize> = truths.iter().flatten().copied().collect();
                    let loss = cross_entropy(logits.view(), &classes)?;
                    loss_meter.update(f64::from(loss), classes.len() as u64);
                }

                for ((pred, names), truth) in decode_predictions(logits.view())
                    .into_iter()
                    .zip(batch.names)
                    .zip(truths)
                {
                    rows.push(PredictionRow {
                        original: names.0,
                        highpass: names.1,
                        label: pred.label,
                        score: pred.score,
                        truth,
                    });
                }

                batches += 1;
                if (i + 1) % print_freq == 0 || i + 1 == total {
                    info!(
                        batch = i + 1,
                        total,
                        loss_avg = loss_meter.avg,
                        "inference_progress"
                    );
                }
            }
        }

        let mean_loss = (loss_meter.count > 0).then_some(loss_meter.avg);
        ctx.report.inference = Some(InferenceSummary {
            batches,
            samples: rows.len() as u64,
            mean_loss,
            predictions_tsv_path: None,
        });
        ctx.batches = batches;
        ctx.mean_loss = mean_loss;
        ctx.predictions = rows;
        ctx.weights = Some(net.to_weights()?);
        Ok(())
    }
}
