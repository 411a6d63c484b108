use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kira_karyotype::cli::{Cli, CommonArgs, Commands, MetricsArgs};
use kira_karyotype::config::ExperimentConfig;
use kira_karyotype::ctx::{Ctx, SnapshotTarget};
use kira_karyotype::eval;
use kira_karyotype::io;
use kira_karyotype::pairing::{TestPairing, load_pair_table};
use kira_karyotype::pipeline::Pipeline;
use kira_karyotype::pipeline::stage0_scaffold::Stage0Scaffold;
use kira_karyotype::pipeline::stage1_index::Stage1Index;
use kira_karyotype::pipeline::stage2_pairing::Stage2Pairing;
use kira_karyotype::pipeline::stage3_dataset::Stage3Dataset;
use kira_karyotype::pipeline::stage4_sampling::Stage4Sampling;
use kira_karyotype::pipeline::stage5_inference::Stage5Inference;
use kira_karyotype::pipeline::stage6_evaluate::Stage6Evaluate;
use kira_karyotype::pipeline::stage7_output::Stage7Output;
use kira_karyotype::schema::v1::RunKind;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate(args) => {
            let config = load_config(&args.common)?;
            let mut ctx = new_ctx(&args.common, std::path::PathBuf::from("."), RunKind::Validate, config);
            ctx.pairing = args.pairing.map(Into::into).unwrap_or(ctx.config.train_pairing);
            if let Some(samples) = args.samples {
                ctx.samples_num = samples;
            }

            let pipeline = Pipeline::new(vec![
                Box::new(Stage1Index::new()),
                Box::new(Stage2Pairing::new()),
                Box::new(Stage3Dataset::new()),
                Box::new(Stage4Sampling::new()),
            ]);
            pipeline.run(&mut ctx)?;

            print_validate_summary(&ctx);
        }
        Commands::Evaluate(args) => {
            let mut config = load_config(&args.common)?;
            if args.weights.is_some() {
                config.model.weights = args.weights.clone();
            }
            let mut ctx = new_ctx(&args.common, args.out, RunKind::Evaluate, config);
            if let Some(pairing) = args.pairing {
                ctx.pairing = pairing.into();
            }
            ctx.write_json = args.json;
            ctx.write_tsv = args.tsv;
            ctx.snapshot = args.snapshot_root.map(|root| SnapshotTarget {
                root,
                run_id: args.run_id,
                epoch: args.epoch,
                overwrite: args.overwrite,
            });

            let pipeline = Pipeline::new(vec![
                Box::new(Stage0Scaffold::new()),
                Box::new(Stage1Index::new()),
                Box::new(Stage2Pairing::new()),
                Box::new(Stage3Dataset::new()),
                Box::new(Stage5Inference::new()),
                Box::new(Stage6Evaluate::new()),
                Box::new(Stage7Output::new()),
            ]);
            pipeline.run(&mut ctx)?;

            print_summary(&ctx)?;
        }
        Commands::Predict(args) => {
            let mut config = load_config(&args.common)?;
            if args.weights.is_some() {
                config.model.weights = args.weights.clone();
            }
            let mut ctx = new_ctx(&args.common, args.out, RunKind::Predict, config);
            ctx.write_json = args.json;
            if let Some(path) = &args.pair_table {
                ctx.test_pairing = TestPairing::Table(load_pair_table(path)?);
            }

            let pipeline = Pipeline::new(vec![
                Box::new(Stage0Scaffold::new()),
                Box::new(Stage1Index::new()),
                Box::new(Stage2Pairing::new()),
                Box::new(Stage3Dataset::new()),
                Box::new(Stage5Inference::new()),
                Box::new(Stage7Output::new()),
            ]);
            pipeline.run(&mut ctx)?;

            print_summary(&ctx)?;
        }
        Commands::Metrics(args) => {
            handle_metrics(args)?;
        }
    }

    Ok(())
}

fn load_config(common: &CommonArgs) -> Result<ExperimentConfig> {
    match &common.config {
        Some(path) => ExperimentConfig::load(path),
        None => Ok(ExperimentConfig::default()),
    }
}

fn new_ctx(
    common: &CommonArgs,
    out_dir: std::path::PathBuf,
    kind: RunKind,
    config: ExperimentConfig,
) -> Ctx {
    let mut ctx = Ctx::new(
        common.collection.clone(),
        out_dir,
        kind,
        config,
        env!("CARGO_PKG_VERSION"),
    );
    ctx.syn_collection = common.syn_collection.clone();
    ctx.threads = common.threads;
    if let Some(seed) = common.seed {
        ctx.seed = seed;
    }
    ctx
}

fn handle_metrics(args: MetricsArgs) -> Result<()> {
    let (predicted, truth) = io::predictions::read_label_pairs(&args.predictions)?;
    let report = eval::evaluate(&predicted, &truth, args.cls_num)?;

    std::fs::create_dir_all(&args.out)?;
    io::json_writer::write_metrics(&args.out.join("metrics.json"), &report)?;
    io::tsv_writer::write_metrics_tsv(&args.out.join("metrics.tsv"), &report)?;

    print!("{}", io::summary::format_metrics(&report));
    Ok(())
}

fn print_summary(ctx: &Ctx) -> Result<()> {
    let summary = io::summary::format_summary(ctx)?;
    print!("{}", summary);
    print_warnings(ctx);
    Ok(())
}

fn print_validate_summary(ctx: &Ctx) {
    println!("kira-karyotype validate ok");
    println!("original: {}", ctx.report.input_meta.original_images);
    println!("highpass: {}", ctx.report.input_meta.highpass_images);
    println!("pairs: {}", ctx.report.input_meta.pairs);
    if let Some(hist) = &ctx.drawn_histogram {
        println!("drawn: {}", hist.iter().sum::<u64>());
    }
    for c in &ctx.report.label_statistic {
        if c.pairs > 0 {
            println!("{}\t{}\t{}\t{}", c.name, c.original, c.highpass, c.pairs);
        }
    }
    print_warnings(ctx);
}

fn print_warnings(ctx: &Ctx) {
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
}
