// ============================================================
// Layer 3 — Sample Domain Types
// ============================================================
// Identifiers, labels and the run mode that decides how labels
// are treated:
//
//   Mode::Train   — labels required, augmentation allowed
//   Mode::Eval    — labels required
//   Mode::Predict — labels never looked up, batches carry none
//
// Reference: Rust Book §6 (Enums), §5 (Structs)

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::domain::features::AlignedFeatures;

// ─── SampleId ─────────────────────────────────────────────────────────────────
/// Opaque key naming one feature resource and its label-table entry,
/// e.g. `BirdVox-DCASE-20k/00053d90-e4b9-4045-a2f1-f39efc90cfa9.wav`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SampleId(String);

impl SampleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SampleId {
    fn from(s: &str) -> Self { Self::new(s) }
}

impl From<String> for SampleId {
    fn from(s: String) -> Self { Self(s) }
}

// ─── Label ────────────────────────────────────────────────────────────────────
/// Binary detection label: 1 = bird present, 0 = absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label(u8);

impl Label {
    pub const ABSENT:  Label = Label(0);
    pub const PRESENT: Label = Label(1);

    pub fn value(self) -> u8 { self.0 }

    pub fn as_f32(self) -> f32 { self.0 as f32 }

    pub fn is_present(self) -> bool { self.0 == 1 }
}

impl FromStr for Label {
    type Err = String;

    /// Accepts "0", "1" and their float spellings ("0.0", "1.0").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("label '{s}' is not a number"))?;
        match v {
            x if x == 0.0 => Ok(Self::ABSENT),
            x if x == 1.0 => Ok(Self::PRESENT),
            _ => Err(format!("label '{s}' is not 0 or 1")),
        }
    }
}

// ─── Mode ─────────────────────────────────────────────────────────────────────
/// What a stream of batches is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Train,
    Eval,
    Predict,
}

impl Mode {
    /// Whether every sample must resolve to a label
    pub fn requires_labels(self) -> bool {
        !matches!(self, Mode::Predict)
    }

    /// Extension appended to `group/key` when building label lookup keys.
    /// Training and validation lists name the audio file; test lists do not.
    pub fn label_key_suffix(self) -> &'static str {
        match self {
            Mode::Train | Mode::Eval => ".wav",
            Mode::Predict => "",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Train   => "train",
            Mode::Eval    => "eval",
            Mode::Predict => "predict",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "train" => Ok(Mode::Train),
            "eval" | "val" | "validation" => Ok(Mode::Eval),
            "predict" | "test" => Ok(Mode::Predict),
            other => Err(format!("unknown mode '{other}' (train, eval, predict)")),
        }
    }
}

// ─── Example ──────────────────────────────────────────────────────────────────
/// One entry of a batch: an aligned tensor and, outside predict
/// mode, its label. Augmented replicas share the id of their source.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub id:        SampleId,
    pub features:  AlignedFeatures,
    pub label:     Option<Label>,
    pub augmented: bool,
}
