// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer wires the data pipeline and the infrastructure
// together to accomplish one goal per use case (stream batches
// for a split, inspect a single sample).
//
// Rules for this layer:
//   - No decoding or resizing math here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// Every knob of a run, serialisable to JSON
pub mod config;

/// Named corpus presets: id lists, sizes, class weights
pub mod profile;

/// Pull batches for one split
pub mod stream_use_case;

/// Load and align a single sample
pub mod inspect_use_case;
