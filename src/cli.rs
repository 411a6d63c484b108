use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::pairing::PairingMode;

#[derive(Debug, Parser)]
#[command(
    name = "kira-karyotype",
    version,
    about = "Two-branch chromosome image classification pipeline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Index, pair and sample a labeled collection without running the model.
    Validate(ValidateArgs),
    /// Score a labeled collection and compute per-class metrics.
    Evaluate(EvaluateArgs),
    /// Predict classes for an unlabeled collection.
    Predict(PredictArgs),
    /// Compute metrics from a predicted/truth TSV.
    Metrics(MetricsArgs),
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    #[arg(long, help = "Collection root (ImageData/, ImageSets/, annotations/)")]
    pub collection: PathBuf,

    #[arg(long, help = "Synthetic collection merged before pairing")]
    pub syn_collection: Option<PathBuf>,

    #[arg(long, help = "Experiment config JSON (defaults to the chromosome experiment)")]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = 0, help = "Number of loader threads (0 = auto)")]
    pub threads: usize,

    #[arg(long, help = "Seed for sampling and augmentation (defaults to model.seed)")]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, value_enum)]
    pub pairing: Option<PairingArg>,

    #[arg(long, help = "Balanced draw size (defaults to train.samples_num)")]
    pub samples: Option<usize>,
}

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, value_enum)]
    pub pairing: Option<PairingArg>,

    #[arg(long, help = "FusionWeights JSON (random init when absent)")]
    pub weights: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub tsv: bool,

    #[arg(long, help = "Save the evaluated weights under <ROOT>/models/...")]
    pub snapshot_root: Option<PathBuf>,

    #[arg(long, default_value_t = 0)]
    pub run_id: u32,

    #[arg(long, default_value_t = 0)]
    pub epoch: usize,

    #[arg(long, default_value_t = false, help = "Replace an existing run directory")]
    pub overwrite: bool,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, help = "<original_id> <highpass_id> table (positional pairing when absent)")]
    pub pair_table: Option<PathBuf>,

    #[arg(long, help = "FusionWeights JSON (random init when absent)")]
    pub weights: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct MetricsArgs {
    #[arg(long, help = "TSV of predicted<TAB>truth class indices")]
    pub predictions: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, default_value_t = crate::config::DEFAULT_CLS_NUM)]
    pub cls_num: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PairingArg {
    Loose,
    Strict,
}

impl From<PairingArg> for PairingMode {
    fn from(arg: PairingArg) -> Self {
        match arg {
            PairingArg::Loose => PairingMode::Loose,
            PairingArg::Strict => PairingMode::Strict,
        }
    }
}
