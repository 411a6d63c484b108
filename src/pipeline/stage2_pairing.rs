use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::pairing::{sample_pairs, test_pairs};
use crate::pipeline::Stage;

pub struct Stage2Pairing;

impl Stage2Pairing {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Pairing {
    fn name(&self) -> &'static str {
        "stage2_pairing"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let original = ctx.original.as_ref().context("original index missing")?;
        let highpass = ctx.highpass.as_ref().context("highpass index missing")?;

        let pairs = if ctx.is_labeled() {
            let (plan, pairs) = sample_pairs(
                original,
                highpass,
                ctx.pairing,
                ctx.config.cls_num,
                ctx.config.max_pairs,
            )?;
            info!(
                mode = %plan.mode,
                planned = plan.total,
                "stage2_pair_plan"
            );
            ctx.report.input_meta.pairing = plan.mode.to_string();
            ctx.plan = Some(plan);
            pairs
        } else {
            ctx.report.input_meta.pairing = "test".to_string();
            test_pairs(original, highpass, &ctx.test_pairing)?
        };

        if pairs.is_empty() {
            let msg = format!(
                "pairing produced no pairs (mode={})",
                ctx.report.input_meta.pairing
            );
            warn!(warning = %msg, "stage2_empty_pairing");
            ctx.warnings.push(msg);
        }

        ctx.report.input_meta.pairs = pairs.len() as u64;
        ctx.pairs = pairs;
        Ok(())
    }
}
