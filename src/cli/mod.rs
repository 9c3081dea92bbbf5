// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All pipeline work is delegated to Layer 2 (application).
//
// Four commands are supported:
//   1. `stream`  — pull batches for a split, report statistics
//   2. `inspect` — run one sample through load and align
//   3. `steps`   — steps per epoch and class weights of a profile
//   4. `config`  — print or save the effective configuration
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ConfigAction, InspectArgs, StepsArgs, StreamArgs};

use crate::application::config::PipelineConfig;
use crate::domain::sample::{Mode, SampleId};

#[derive(Parser, Debug)]
#[command(
    name = "birdfeat",
    version,
    about = "Stream fixed-length acoustic feature batches for bird-audio detection."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. The CLI only routes
    /// and prints; it never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Stream(args)  => run_stream(args),
            Commands::Inspect(args) => run_inspect(args),
            Commands::Steps(args)   => run_steps(args),
            Commands::Config(args)  => match args.action {
                ConfigAction::Show(a) => run_config_show(a),
                ConfigAction::Save { path, pipeline } => run_config_save(path, pipeline),
            },
        }
    }
}

fn run_stream(args: StreamArgs) -> Result<()> {
    use crate::application::stream_use_case::{ConstantScorer, StreamUseCase};

    let mode = args.mode;
    let cfg  = PipelineConfig::try_from(args.pipeline)?;
    tracing::info!("Streaming {} split of profile {}", mode, cfg.profile);

    let mut use_case = StreamUseCase::new(cfg, mode)
        .steps(args.steps)
        .tensors(args.tensors);
    if let Some(path) = args.predictions {
        use_case = use_case.predictions(path, Box::new(ConstantScorer(args.prior)));
    }
    let report = use_case.execute()?;

    println!("batches   : {}", report.batches);
    println!("examples  : {} ({} augmented)", report.examples, report.augmented);
    if mode.requires_labels() {
        println!("labels    : {} present / {} absent", report.present, report.absent);
    }
    println!("values    : min {:.4}  max {:.4}  mean {:.4}", report.min, report.max, report.mean);
    println!("passes    : {}", report.passes);
    if let Some(dims) = report.tensor_dims {
        println!("tensor    : {dims:?}");
    }
    if let Some(rows) = report.predictions {
        println!("predicted : {rows} items");
    }
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let cfg    = PipelineConfig::try_from(args.pipeline)?;
    let report = InspectUseCase::new(cfg).inspect(&SampleId::new(args.id), args.mode)?;

    let (lo, hi, mean) = report.original_stats;
    println!("id      : {}", report.id);
    println!("file    : {}", report.path.display());
    println!("stored  : {:?}  min {lo:.4}  max {hi:.4}  mean {mean:.4}", report.original);
    let (lo, hi, mean) = report.aligned_stats;
    println!("aligned : {:?}  min {lo:.4}  max {hi:.4}  mean {mean:.4}", report.aligned);
    match report.label {
        Some(l) => println!("label   : {}", l.value()),
        None    => println!("label   : -"),
    }
    Ok(())
}

fn run_steps(args: StepsArgs) -> Result<()> {
    let cfg = PipelineConfig::try_from(args.pipeline)?;
    let w   = cfg.profile.class_weights();

    println!("profile {} (batch {}, augment x{})", cfg.profile, cfg.batch_size, cfg.augment_multiplier);
    for mode in [Mode::Train, Mode::Eval, Mode::Predict] {
        let split = cfg.profile.split(mode);
        println!(
            "  {:<8} {:<16} {:>6} items  {:>5} steps",
            mode.to_string(),
            split.list,
            split.size,
            cfg.steps(mode)
        );
    }
    println!("  class weights: {{0: {:.2}, 1: {:.2}}}", w.absent, w.present);
    Ok(())
}

fn run_config_show(args: StepsArgs) -> Result<()> {
    let cfg = PipelineConfig::try_from(args.pipeline)?;
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}

fn run_config_save(path: std::path::PathBuf, pipeline: commands::PipelineArgs) -> Result<()> {
    use crate::infra::config_store::ConfigStore;

    let cfg = PipelineConfig::try_from(pipeline)?;
    ConfigStore::new(&path).save(&cfg)?;
    println!("Saved configuration to '{}'", path.display());
    Ok(())
}
