use anyhow::{Result, bail};
use tracing::info;

use crate::ctx::Ctx;
use crate::eval::evaluate;
use crate::pipeline::Stage;

pub struct Stage6Evaluate;

impl Stage6Evaluate {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage6Evaluate {
    fn name(&self) -> &'static str {
        "stage6_evaluate"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let mut predicted = Vec::with_capacity(ctx.predictions.len());
        let mut truth = Vec::with_capacity(ctx.predictions.len());
        for row in &ctx.predictions {
            let Some(t) = row.truth else {
                bail!("prediction for {} has no ground truth", row.original);
            };
            predicted.push(row.label);
            truth.push(t);
        }

        let report = evaluate(&predicted, &truth, ctx.config.cls_num)?;
        info!(
            samples = report.samples,
            accuracy = report.overall.accuracy,
            macro_f1 = report.overall.macro_f1,
            "stage6_metrics"
        );
        ctx.report.metrics = Some(report.clone());
        ctx.metrics = Some(report);
        Ok(())
    }
}
