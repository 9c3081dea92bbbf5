// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The batch assembler only talks to its collaborators through
// these traits:
//   - FeatureLoader  implements FeatureSource
//   - LabelTable     implements LabelSource
//   - ShiftAugmenter implements Augmenter
//
// Tests swap in in-memory implementations without touching disk.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Trait Objects)

use rand::RngCore;

use crate::domain::error::Result;
use crate::domain::features::{AlignedFeatures, FeatureMatrix};
use crate::domain::sample::{Label, SampleId};

// ─── FeatureSource ────────────────────────────────────────────────────────────
/// Anything that can produce a normalised feature matrix for a sample id.
///
/// Implementations:
///   - FeatureLoader → reads safetensors / npy / HTK files from a directory
pub trait FeatureSource {
    /// Decode and normalise the features of one sample.
    /// A missing or malformed resource is an error, never a skip.
    fn load(&self, id: &SampleId) -> Result<FeatureMatrix>;
}

// ─── LabelSource ──────────────────────────────────────────────────────────────
/// Read-only lookup from sample id to label.
///
/// Implementations:
///   - LabelTable → built from one or more CSV label tables
pub trait LabelSource {
    /// `None` when the id has no entry. Whether that is fatal
    /// is decided by the caller's mode.
    fn resolve(&self, id: &SampleId) -> Option<Label>;
}

// ─── Augmenter ────────────────────────────────────────────────────────────────
/// Produces a randomly perturbed replica of one aligned sample.
///
/// The random source is passed in on every call so that a seeded
/// assembler reproduces the same replicas run after run.
pub trait Augmenter {
    fn augment(&self, sample: &AlignedFeatures, rng: &mut dyn RngCore) -> AlignedFeatures;
}
