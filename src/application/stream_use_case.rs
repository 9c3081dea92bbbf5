// ============================================================
// Layer 2 — StreamUseCase
// ============================================================
// Builds a batch assembler for one split and pulls batches from
// it, the way a training or evaluation loop would:
//
//   Step 1: Validate the configuration
//   Step 2: Read the split's id list         (Layer 4 - data)
//   Step 3: Load the label tables            (Layer 6 - infra)
//   Step 4: Build the assembler              (Layer 4 - data)
//   Step 5: Pull `steps` batches, collecting statistics and,
//           optionally, stacking them into Burn tensors
//   Step 6: In predict mode, optionally score every test item
//           once and write the submission file (Layer 6 - infra)
//
// The classifier itself lives outside this crate; anything that
// can turn a batch into probabilities plugs in as a `Scorer`.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §4 (Batcher)

use anyhow::{ensure, Context, Result};
use burn::backend::NdArray;
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::data::assembler::{BatchAssembler, FeatureBatch};
use crate::data::dataset::IdSequence;
use crate::domain::features::summarise;
use crate::domain::sample::Mode;
use crate::infra::{label_table::LabelTable, predictions::PredictionWriter};

type CpuBackend = NdArray;

// ─── Scorer ───────────────────────────────────────────────────────────────────
/// Turns a batch into one bird-presence probability per example.
pub trait Scorer {
    fn score(&mut self, batch: &FeatureBatch) -> Result<Vec<f64>>;
}

/// Scores every example with the same probability.
/// Produces a prior-only baseline submission.
pub struct ConstantScorer(pub f64);

impl Scorer for ConstantScorer {
    fn score(&mut self, batch: &FeatureBatch) -> Result<Vec<f64>> {
        Ok(vec![self.0; batch.len()])
    }
}

// ─── StreamReport ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamReport {
    pub batches:   usize,
    pub examples:  usize,
    pub augmented: usize,
    pub present:   usize,
    pub absent:    usize,
    /// Passes over the id list started during the run
    pub passes:    usize,
    pub min:       f32,
    pub max:       f32,
    pub mean:      f32,
    /// `[N, T0, F, 1]` of the last stacked batch
    pub tensor_dims: Option<[usize; 4]>,
    pub predictions: Option<usize>,
}

// ─── StreamUseCase ────────────────────────────────────────────────────────────
pub struct StreamUseCase {
    config:      PipelineConfig,
    mode:        Mode,
    steps:       Option<usize>,
    tensors:     bool,
    predictions: Option<(PathBuf, Box<dyn Scorer>)>,
}

impl StreamUseCase {
    pub fn new(config: PipelineConfig, mode: Mode) -> Self {
        Self { config, mode, steps: None, tensors: false, predictions: None }
    }

    /// Pull this many batches instead of one epoch
    pub fn steps(mut self, steps: Option<usize>) -> Self {
        self.steps = steps;
        self
    }

    /// Also stack every batch into Burn tensors
    pub fn tensors(mut self, tensors: bool) -> Self {
        self.tensors = tensors;
        self
    }

    /// Write a submission file (predict mode only)
    pub fn predictions(mut self, path: impl Into<PathBuf>, scorer: Box<dyn Scorer>) -> Self {
        self.predictions = Some((path.into(), scorer));
        self
    }

    /// Construct the assembler for the configured profile and mode.
    pub fn build_assembler(&self) -> Result<BatchAssembler> {
        let cfg  = &self.config;
        let mode = self.mode;

        // ── Step 2: id list ───────────────────────────────────────────────────
        let list = cfg.list_path(mode);
        let ids  = IdSequence::from_file(&list)
            .with_context(|| format!("Cannot read the {mode} id list"))?;
        let declared = cfg.profile.split(mode).size;
        if ids.id_count() != declared {
            tracing::warn!(
                "'{}' holds {} ids but profile {} declares {}",
                list.display(),
                ids.id_count(),
                cfg.profile,
                declared
            );
        }

        // ── Step 4: assembler ─────────────────────────────────────────────────
        let mut builder = BatchAssembler::builder(ids, Box::new(cfg.feature_loader()), mode)
            .batch_size(cfg.batch_size)
            .augment_multiplier(cfg.augment_multiplier_for(mode))
            .seed(cfg.seed)
            .target_frames(cfg.target_frames)
            .bins(cfg.bins)
            .fidelity(cfg.fidelity)
            .augmenter(Box::new(cfg.augmentation));
        if let Some(shuffle) = cfg.shuffle {
            builder = builder.shuffle(shuffle);
        }

        // ── Step 3: labels ────────────────────────────────────────────────────
        if mode.requires_labels() {
            let table = LabelTable::load(&cfg.label_paths(), mode)
                .context("Cannot load label tables")?;
            builder = builder.labels(Box::new(table));
        }

        Ok(builder.build()?)
    }

    pub fn execute(mut self) -> Result<StreamReport> {
        // ── Step 1: configuration ─────────────────────────────────────────────
        self.config.validate()?;
        if self.predictions.is_some() {
            ensure!(self.mode == Mode::Predict, "predictions are only written in predict mode");
        }

        let mut assembler = self.build_assembler()?;
        let id_count = assembler.id_count();
        let steps    = self.steps.unwrap_or_else(|| self.config.steps(self.mode));
        tracing::info!(
            "Streaming {} {} batches from profile {}",
            steps,
            self.mode,
            self.config.profile
        );

        let mut writer = match &self.predictions {
            Some((path, _)) => Some(PredictionWriter::create(path)?),
            None => None,
        };
        let device = Default::default();

        let mut report = StreamReport {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            ..Default::default()
        };
        let mut mean_sum = 0.0f64;
        let mut written  = 0usize;

        // ── Step 5: pull batches ──────────────────────────────────────────────
        for (step, batch) in assembler.by_ref().take(steps).enumerate() {
            let batch = batch.with_context(|| format!("Batch {} failed", step + 1))?;

            let values: Vec<f32> = batch
                .examples()
                .iter()
                .flat_map(|e| e.features.values().iter().copied())
                .collect();
            let (min, max, mean) = summarise(&values);
            let present = batch
                .labels()
                .map(|l| l.iter().filter(|l| l.is_present()).count());

            tracing::info!(
                "Batch {:>4}: {} examples, {} present, min {:.4} max {:.4} mean {:.4}",
                step + 1,
                batch.len(),
                present.map_or_else(|| "-".to_string(), |p| p.to_string()),
                min,
                max,
                mean
            );

            report.batches  += 1;
            report.examples += batch.len();
            report.augmented += batch.examples().iter().filter(|e| e.augmented).count();
            if let Some(p) = present {
                report.present += p;
                report.absent  += batch.len() - p;
            }
            report.min = report.min.min(min);
            report.max = report.max.max(max);
            mean_sum  += mean as f64;

            if self.tensors {
                let tensors = batch.to_tensors::<CpuBackend>(&device);
                report.tensor_dims = Some(tensors.features.dims());
            }

            // ── Step 6: predictions ───────────────────────────────────────────
            // The last predict batch wraps to the list start; those
            // repeats are not written.
            if let (Some(w), Some((_, scorer))) = (writer.as_mut(), self.predictions.as_mut()) {
                let scores = scorer.score(&batch)?;
                ensure!(
                    scores.len() == batch.len(),
                    "scorer returned {} scores for {} examples",
                    scores.len(),
                    batch.len()
                );
                for (example, score) in batch.examples().iter().zip(scores) {
                    if written < id_count {
                        w.write_row(&example.id, score)?;
                        written += 1;
                    }
                }
            }
        }

        if report.batches > 0 {
            report.mean = (mean_sum / report.batches as f64) as f32;
        } else {
            report.min = 0.0;
            report.max = 0.0;
        }
        report.passes = assembler.passes();
        if let Some(w) = writer {
            report.predictions = Some(w.finish()?);
        }

        tracing::info!(
            "Streamed {} batches ({} examples) over {} pass(es)",
            report.batches,
            report.examples,
            report.passes
        );
        Ok(report)
    }
}
