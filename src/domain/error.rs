// ============================================================
// Layer 3 — Pipeline Errors
// ============================================================
// Every failure the data path can raise. All of them are fatal
// to a streaming run: the assembler stops at the first one and
// the caller decides what to report.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)
//            thiserror crate documentation

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::features::MatrixShapeError;

// ─── FormatError ──────────────────────────────────────────────────────────────
/// Why a single feature file could not be decoded.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("file ends after {available} bytes, {needed} required")]
    Truncated { needed: usize, available: usize },

    #[error("bad header: {0}")]
    Header(String),

    #[error("unsupported element type '{0}'")]
    UnsupportedDtype(String),

    #[error("container: {0}")]
    Container(String),

    #[error(transparent)]
    Shape(#[from] MatrixShapeError),
}

// ─── PipelineError ────────────────────────────────────────────────────────────
/// Errors raised while loading, aligning, labelling or batching samples.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The feature resource is missing or could not be parsed
    #[error("cannot decode features from '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// The decoded resource holds no frames at all
    #[error("sample '{id}' has no feature frames")]
    EmptyFeatures { id: String },

    /// Train and eval runs need a label for every sample
    #[error("no label for sample '{id}'")]
    LabelNotFound { id: String },

    /// A tensor left the aligner with the wrong dimensions,
    /// or the stored features have the wrong number of bins
    #[error("sample '{id}' has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        id:       String,
        expected: (usize, usize),
        actual:   (usize, usize),
    },

    /// A label table row could not be parsed
    #[error("{}:{line}: {reason}", path.display())]
    LabelTable {
        path:   PathBuf,
        line:   usize,
        reason: String,
    },

    /// The id list is unreadable or empty
    #[error("id list '{}': {reason}", path.display())]
    IdList { path: PathBuf, reason: String },

    /// Construction parameters that can never produce a valid batch
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
