// ============================================================
// Layer 4 — Feature Loader
// ============================================================
// Reads one sample's features from disk, decodes them with the
// configured format, and normalises the values.
//
// Resource path:
//   <feature_dir>/<sample id><extension>
//
//   e.g. features/BirdVox-DCASE-20k/0a1b.wav.npy
//
// The parametric (HTK) files were written per audio file without
// the ".wav" part, so that suffix is removed from the id first:
//
//   features/BirdVox-DCASE-20k/0a1b.mfc
//
// Exactly one format is active for a whole run. A missing or
// malformed file is a hard error: nothing is skipped.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §6 (Enums and Pattern Matching)

use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::PathBuf, str::FromStr};

use crate::data::formats::{container, htk, npy};
use crate::data::preprocessor::{MinMaxBounds, Preprocessor};
use crate::domain::error::{FormatError, PipelineError, Result};
use crate::domain::features::FeatureMatrix;
use crate::domain::sample::SampleId;
use crate::domain::traits::FeatureSource;

// ─── FeatureFormat ────────────────────────────────────────────────────────────
/// The storage format of every feature file in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureFormat {
    /// Named array inside a safetensors container
    Container,
    /// Flat NumPy array
    RawBinary,
    /// HTK parameter file
    Parametric,
}

impl FeatureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FeatureFormat::Container  => ".safetensors",
            FeatureFormat::RawBinary  => ".npy",
            FeatureFormat::Parametric => ".mfc",
        }
    }

    /// The part of the sample id that names the file
    fn resource_stem(self, id: &SampleId) -> &str {
        match self {
            FeatureFormat::Parametric => {
                id.as_str().strip_suffix(".wav").unwrap_or(id.as_str())
            }
            _ => id.as_str(),
        }
    }
}

impl fmt::Display for FeatureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeatureFormat::Container  => "container",
            FeatureFormat::RawBinary  => "raw-binary",
            FeatureFormat::Parametric => "parametric",
        })
    }
}

impl FromStr for FeatureFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "container" | "safetensors" | "h5" => Ok(FeatureFormat::Container),
            "raw-binary" | "npy"               => Ok(FeatureFormat::RawBinary),
            "parametric" | "htk" | "mfc"       => Ok(FeatureFormat::Parametric),
            other => Err(format!(
                "unknown feature format '{other}' (container, raw-binary, parametric)"
            )),
        }
    }
}

// ─── FeatureLoader ────────────────────────────────────────────────────────────
/// Loads and normalises features for sample ids from a directory.
pub struct FeatureLoader {
    dir:           PathBuf,
    format:        FeatureFormat,
    preprocessor:  Preprocessor,
    container_key: String,
}

impl FeatureLoader {
    pub fn new(dir: impl Into<PathBuf>, format: FeatureFormat, bounds: Option<MinMaxBounds>) -> Self {
        Self {
            dir: dir.into(),
            format,
            preprocessor: Preprocessor::new(bounds),
            container_key: container::DEFAULT_KEY.to_string(),
        }
    }

    /// Read a different array name from container files
    pub fn with_container_key(mut self, key: impl Into<String>) -> Self {
        self.container_key = key.into();
        self
    }

    pub fn format(&self) -> FeatureFormat {
        self.format
    }

    /// Where the features of `id` live on disk
    pub fn path_for(&self, id: &SampleId) -> PathBuf {
        let stem = self.format.resource_stem(id);
        self.dir.join(format!("{stem}{}", self.format.extension()))
    }

    fn decode(&self, bytes: &[u8]) -> std::result::Result<FeatureMatrix, FormatError> {
        match self.format {
            FeatureFormat::Container  => container::decode(bytes, &self.container_key),
            FeatureFormat::RawBinary  => npy::decode(bytes),
            FeatureFormat::Parametric => htk::decode(bytes),
        }
    }
}

impl FeatureSource for FeatureLoader {
    fn load(&self, id: &SampleId) -> Result<FeatureMatrix> {
        let path = self.path_for(id);

        let mut matrix = fs::read(&path)
            .map_err(FormatError::from)
            .and_then(|bytes| self.decode(&bytes))
            .map_err(|source| match source {
                FormatError::Shape(e) if e.frames == 0 => {
                    PipelineError::EmptyFeatures { id: id.to_string() }
                }
                source => PipelineError::Decode { path: path.clone(), source },
            })?;

        self.preprocessor.normalise(self.format, &mut matrix);

        tracing::debug!(
            "Loaded '{}' ({} frames x {} bins)",
            path.display(),
            matrix.frames(),
            matrix.bins()
        );
        Ok(matrix)
    }
}
