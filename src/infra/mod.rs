// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File formats that sit at the edges of the pipeline rather
// than inside it:
//
//   label_table.rs  — CSV label tables
//                     Parses one or more (itemid, datasetid,
//                     hasbird) tables into the id → label
//                     lookup the assembler consults.
//
//   predictions.rs  — Submission CSV writer
//                     Writes `itemid,prediction` rows for the
//                     test split.
//
//   config_store.rs — Pipeline configuration persistence
//                     Saves and loads PipelineConfig as JSON so
//                     a run can be repeated exactly.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Label table loading and lookup
pub mod label_table;

/// Prediction CSV writer
pub mod predictions;

/// PipelineConfig JSON persistence
pub mod config_store;
