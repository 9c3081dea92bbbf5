// ============================================================
// Layer 6 — Prediction Writer
// ============================================================
// Writes per-item detection scores to a submission CSV.
//
// Example output:
//   itemid,prediction
//   00053d90-e4b9-4045-a2f1-f39efc90cfa9,0.912345
//   64486,0.031000
//   ...
//
// The item id is the sample id with its dataset prefix removed
// (everything up to and including the first '/') and any
// trailing ".wav" dropped:
//
//   BirdVox-DCASE-20k/00053d90.wav → 00053d90
//
// Scores are probabilities and must lie in [0, 1]. Ids that
// contain a comma or a quote are quoted by the CSV writer.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{bail, Context, Result};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use crate::domain::sample::SampleId;

/// The submission id for a sample id
pub fn item_id(id: &SampleId) -> &str {
    let s = id.as_str();
    let s = s.split_once('/').map_or(s, |(_, rest)| rest);
    s.strip_suffix(".wav").unwrap_or(s)
}

pub struct PredictionWriter {
    path:   PathBuf,
    out:    csv::Writer<File>,
    rows:   usize,
}

impl PredictionWriter {
    /// Create (or truncate) the CSV and write its header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }

        let file = File::create(&path)
            .with_context(|| format!("Cannot create prediction file '{}'", path.display()))?;
        let mut out = csv::Writer::from_writer(file);
        out.write_record(["itemid", "prediction"])?;

        tracing::debug!("Created prediction file '{}'", path.display());
        Ok(Self { path, out, rows: 0 })
    }

    pub fn write_row(&mut self, id: &SampleId, score: f64) -> Result<()> {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            bail!("prediction for '{id}' must be a probability, got {score}");
        }
        let score = format!("{score:.6}");
        self.out.write_record([item_id(id), score.as_str()])?;
        self.rows += 1;
        Ok(())
    }

    /// Flush to disk and return the number of rows written
    pub fn finish(mut self) -> Result<usize> {
        self.out
            .flush()
            .with_context(|| format!("Cannot write '{}'", self.path.display()))?;
        tracing::info!("Wrote {} predictions to '{}'", self.rows, self.path.display());
        Ok(self.rows)
    }
}
