// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `stream`, `inspect`, `steps` and
// `config`, and the pipeline flags they all share.
//
// Every pipeline flag is optional: an unset flag keeps the value
// from --config (or the built-in default), so
//
//   birdfeat stream --config run.json --batch-size 4
//
// changes exactly one knob of a saved run.
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{config::PipelineConfig, profile::DatasetProfile};
use crate::data::{aligner::ShrinkFidelity, loader::FeatureFormat, preprocessor::MinMaxBounds};
use crate::domain::sample::Mode;
use crate::infra::config_store::ConfigStore;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pull batches for one split and report statistics
    Stream(StreamArgs),

    /// Load and align a single sample
    Inspect(InspectArgs),

    /// Print steps per epoch and class weights for a profile
    Steps(StepsArgs),

    /// Print or save the effective configuration
    Config(ConfigArgs),
}

// ─── Shared pipeline flags ────────────────────────────────────────────────────
#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    /// JSON config file to start from
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Dataset profile (birdvox, warblr, freefield, warblr-freefield, all, smoke)
    #[arg(long)]
    pub profile: Option<DatasetProfile>,

    /// Feature file format (container, raw-binary, parametric)
    #[arg(long)]
    pub format: Option<FeatureFormat>,

    /// Directory holding the feature files
    #[arg(long)]
    pub feature_dir: Option<PathBuf>,

    /// Directory holding the label tables
    #[arg(long)]
    pub label_dir: Option<PathBuf>,

    /// Label table file name; repeat to merge several
    #[arg(long = "label-table")]
    pub label_tables: Vec<String>,

    /// Directory holding the id lists
    #[arg(long)]
    pub list_dir: Option<PathBuf>,

    /// Array name inside container files
    #[arg(long)]
    pub container_key: Option<String>,

    /// Frames per aligned sample
    #[arg(long)]
    pub target_frames: Option<usize>,

    /// Frequency bins per frame
    #[arg(long)]
    pub bins: Option<usize>,

    /// Examples per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Examples produced per training sample (1 = no augmentation)
    #[arg(long)]
    pub augment: Option<usize>,

    /// Shuffle the id list once per pass (default: train only)
    #[arg(long)]
    pub shuffle: Option<bool>,

    /// Seed for shuffling and augmentation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Global minimum for raw-binary normalisation
    #[arg(long, requires = "norm_max")]
    pub norm_min: Option<f64>,

    /// Global maximum for raw-binary normalisation
    #[arg(long, requires = "norm_min")]
    pub norm_max: Option<f64>,

    /// Large-shrink averaging (block-mean, reference)
    #[arg(long)]
    pub fidelity: Option<ShrinkFidelity>,
}

/// Convert CLI flags into the application-layer PipelineConfig.
/// The application layer never sees clap types.
impl TryFrom<PipelineArgs> for PipelineConfig {
    type Error = anyhow::Error;

    fn try_from(a: PipelineArgs) -> Result<Self> {
        let mut cfg = match &a.config {
            Some(path) => ConfigStore::new(path).load()?,
            None => PipelineConfig::default(),
        };

        if let Some(v) = a.profile       { cfg.profile = v; }
        if let Some(v) = a.format        { cfg.format = v; }
        if let Some(v) = a.feature_dir   { cfg.feature_dir = v; }
        if let Some(v) = a.label_dir     { cfg.label_dir = v; }
        if !a.label_tables.is_empty()    { cfg.label_tables = a.label_tables; }
        if let Some(v) = a.list_dir      { cfg.list_dir = v; }
        if let Some(v) = a.container_key { cfg.container_key = v; }
        if let Some(v) = a.target_frames { cfg.target_frames = v; }
        if let Some(v) = a.bins          { cfg.bins = v; }
        if let Some(v) = a.batch_size    { cfg.batch_size = v; }
        if let Some(v) = a.augment       { cfg.augment_multiplier = v; }
        if let Some(v) = a.shuffle       { cfg.shuffle = Some(v); }
        if let Some(v) = a.seed          { cfg.seed = v; }
        if let Some(v) = a.fidelity      { cfg.fidelity = v; }
        if let (Some(min), Some(max)) = (a.norm_min, a.norm_max) {
            cfg.normalization = Some(MinMaxBounds { min, max });
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

// ─── Subcommand arguments ─────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct StreamArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Which split to stream (train, eval, predict)
    #[arg(long, default_value = "train")]
    pub mode: Mode,

    /// Number of batches to pull (default: one epoch)
    #[arg(long)]
    pub steps: Option<usize>,

    /// Also stack each batch into Burn tensors
    #[arg(long)]
    pub tensors: bool,

    /// Write a prior-only submission CSV (predict mode)
    #[arg(long)]
    pub predictions: Option<PathBuf>,

    /// Probability written for every item with --predictions
    #[arg(long, default_value_t = 0.5)]
    pub prior: f64,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Sample id, e.g. BirdVox-DCASE-20k/00053d90.wav
    pub id: String,

    /// Label lookup mode (train, eval, predict)
    #[arg(long, default_value = "eval")]
    pub mode: Mode,
}

#[derive(Args, Debug)]
pub struct StepsArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as JSON
    Show(StepsArgs),

    /// Write the effective configuration to a JSON file
    Save {
        /// Destination file
        path: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}
