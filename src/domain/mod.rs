// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits describing what the pipeline
// moves around: feature matrices, aligned tensors, sample ids,
// labels, run modes and the errors that can stop a run.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Pipeline and decode errors
pub mod error;

// Feature matrices before and after alignment
pub mod features;

// Sample ids, labels, run modes and batch examples
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;
