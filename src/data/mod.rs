// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a feature file on disk and a fixed-size
// batch. The pipeline flows in this order:
//
//   id list file
//       │
//       ▼
//   IdSequence        → ordered ids, reshuffled once per pass
//       │
//       ▼
//   FeatureLoader     → decodes container / npy / HTK files
//       │               and normalises the values
//       ▼
//   TemporalAligner   → pads or shrinks to exactly T0 frames
//       │
//       ▼
//   ShiftAugmenter    → optional rolled replicas (train only)
//       │
//       ▼
//   BatchAssembler    → labels, buffers, emits N examples
//       │
//       ▼
//   FeatureBatcher    → stacks a batch into Burn tensors
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Byte-level decoders for the three feature file formats
pub mod formats;

/// Resolves sample ids to files and decodes them
pub mod loader;

/// Format-specific value normalisation
pub mod preprocessor;

/// Fixed-length padding and shrinking
pub mod aligner;

/// Random time/frequency shifts with wraparound
pub mod augment;

/// The id list, exposed through Burn's Dataset trait
pub mod dataset;

/// The cyclic batch generator
pub mod assembler;

/// Implements Burn's Batcher trait for aligned examples
pub mod batcher;
