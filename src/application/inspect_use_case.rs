// ============================================================
// Layer 2 — Inspect Use Case
// ============================================================
// Runs a single sample through load → normalise → align and
// reports what happened to it:
//   1. Resolve the feature path for the id
//   2. Decode and normalise it
//   3. Align it to the configured frame count
//   4. Look up its label, if the mode has labels

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::data::aligner::TemporalAligner;
use crate::domain::sample::{Label, Mode, SampleId};
use crate::domain::traits::{FeatureSource, LabelSource};
use crate::infra::label_table::LabelTable;

#[derive(Debug, Clone, PartialEq)]
pub struct InspectReport {
    pub id:             SampleId,
    pub path:           PathBuf,
    /// (frames, bins) as stored
    pub original:       (usize, usize),
    pub original_stats: (f32, f32, f32),
    /// (frames, bins, channels) after alignment
    pub aligned:        [usize; 3],
    pub aligned_stats:  (f32, f32, f32),
    pub label:          Option<Label>,
}

pub struct InspectUseCase {
    config: PipelineConfig,
}

impl InspectUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn inspect(&self, id: &SampleId, mode: Mode) -> Result<InspectReport> {
        let cfg = &self.config;
        cfg.validate()?;

        let loader = cfg.feature_loader();
        let path   = loader.path_for(id);
        let matrix = loader
            .load(id)
            .with_context(|| format!("Cannot inspect '{id}'"))?;

        let aligner = TemporalAligner::new(cfg.target_frames)?.with_fidelity(cfg.fidelity);
        let aligned = aligner.align(&matrix);

        // A missing label is reported, not fatal
        let label = if mode.requires_labels() {
            LabelTable::load(&cfg.label_paths(), mode)
                .context("Cannot load label tables")?
                .resolve(id)
        } else {
            None
        };

        tracing::info!(
            "'{}': {}x{} → {:?}",
            id,
            matrix.frames(),
            matrix.bins(),
            aligned.shape()
        );

        Ok(InspectReport {
            id: id.clone(),
            path,
            original: (matrix.frames(), matrix.bins()),
            original_stats: matrix.summary(),
            aligned: aligned.shape(),
            aligned_stats: aligned.summary(),
            label,
        })
    }
}
