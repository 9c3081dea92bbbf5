// ============================================================
// Layer 2 — Pipeline Configuration
// ============================================================
// Every knob of a streaming run in one serialisable struct.
//
// Values come from three places, later ones winning:
//   1. PipelineConfig::default()   (the constants below)
//   2. a JSON file given with --config
//   3. individual CLI flags
//
// The #[serde(default)] attribute lets a JSON file set only the
// fields it cares about; everything else keeps its default.
//
// Reference: serde documentation (field attributes)
//            Rust Book §5 (Structs)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::profile::DatasetProfile;
use crate::data::aligner::ShrinkFidelity;
use crate::data::augment::ShiftAugmenter;
use crate::data::loader::{FeatureFormat, FeatureLoader};
use crate::data::preprocessor::MinMaxBounds;
use crate::domain::sample::Mode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub feature_dir:        PathBuf,
    pub label_dir:          PathBuf,
    pub label_tables:       Vec<String>,
    pub list_dir:           PathBuf,
    pub profile:            DatasetProfile,
    pub format:             FeatureFormat,
    /// Array name read from container files
    pub container_key:      String,
    pub target_frames:      usize,
    pub bins:               usize,
    pub batch_size:         usize,
    pub augment_multiplier: usize,
    /// `None` shuffles in train mode only
    pub shuffle:            Option<bool>,
    pub seed:               u64,
    /// Global min/max for raw-binary features
    pub normalization:      Option<MinMaxBounds>,
    pub fidelity:           ShrinkFidelity,
    pub augmentation:       ShiftAugmenter,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feature_dir:        "workingfiles/features_high_temporal/20_10_180_norm".into(),
            label_dir:          "labels".into(),
            label_tables:       vec![
                "BirdVox-DCASE-20k.csv".to_string(),
                "ff1010bird.csv".to_string(),
                "warblrb10k.csv".to_string(),
            ],
            list_dir:           "workingfiles/filelists".into(),
            profile:            DatasetProfile::Birdvox,
            format:             FeatureFormat::RawBinary,
            container_key:      "features".to_string(),
            target_frames:      1000,
            bins:               180,
            batch_size:         16,
            augment_multiplier: 1,
            shuffle:            None,
            seed:               42,
            normalization:      None,
            fidelity:           ShrinkFidelity::default(),
            augmentation:       ShiftAugmenter::default(),
        }
    }
}

impl PipelineConfig {
    /// Reject values no run could work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.target_frames > 0, "target_frames must be at least 1");
        ensure!(self.bins > 0, "bins must be at least 1");
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(self.augment_multiplier > 0, "augment_multiplier must be at least 1");
        ensure!(!self.label_tables.is_empty(), "at least one label table is required");
        if let Some(b) = self.normalization.filter(MinMaxBounds::is_active) {
            ensure!(
                b.max > b.min,
                "normalization max ({}) must exceed min ({})",
                b.max,
                b.min
            );
        }
        ShiftAugmenter::new(self.augmentation.frame_range, self.augmentation.bin_range)?;
        Ok(())
    }

    /// Id list file for the profile's split in `mode`
    pub fn list_path(&self, mode: Mode) -> PathBuf {
        self.list_dir.join(self.profile.split(mode).list)
    }

    pub fn label_paths(&self) -> Vec<PathBuf> {
        self.label_tables.iter().map(|t| self.label_dir.join(t)).collect()
    }

    pub fn feature_loader(&self) -> FeatureLoader {
        FeatureLoader::new(&self.feature_dir, self.format, self.normalization)
            .with_container_key(&self.container_key)
    }

    /// Examples produced per visited sample in `mode`. Validation and
    /// test streams are never augmented.
    pub fn augment_multiplier_for(&self, mode: Mode) -> usize {
        match mode {
            Mode::Train                => self.augment_multiplier,
            Mode::Eval | Mode::Predict => 1,
        }
    }

    /// Batches in one epoch of `mode` for the configured profile
    pub fn steps(&self, mode: Mode) -> usize {
        self.profile.steps(mode, self.batch_size, self.augment_multiplier_for(mode))
    }
}
