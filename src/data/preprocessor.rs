// ============================================================
// Layer 4 — Feature Normaliser
// ============================================================
// Applies the format-specific value scaling right after decode.
//
//   Container  → x' = (x + 15.0966) / (15.0966 + 2.25745)
//   RawBinary  → x' = (x - min) / (max - min)   if bounds are set
//                x' = x                          otherwise
//   Parametric → x' = x / 17.0
//
// The container constants were fit to corpus statistics and must
// match the values the classifier was trained on bit for bit.
// Arithmetic happens in f32, like the float32 arrays the
// constants were first applied to; any sum of constants is folded
// in f64 before narrowing.
//
// Reference: Rust Book §13 (Iterators and Closures)

use serde::{Deserialize, Serialize};

use crate::data::loader::FeatureFormat;
use crate::domain::features::FeatureMatrix;

pub const CONTAINER_OFFSET: f32 = 15.0966;
pub const CONTAINER_SCALE: f32 = (15.0966_f64 + 2.25745_f64) as f32;
pub const PARAMETRIC_SCALE: f32 = 17.0;

/// Global min/max statistics for raw-binary features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxBounds {
    pub min: f64,
    pub max: f64,
}

impl MinMaxBounds {
    /// Bounds are only applied when both are non-zero; a zero
    /// bound is how an unset statistic has always been spelled.
    pub fn is_active(&self) -> bool {
        self.min != 0.0 && self.max != 0.0
    }
}

pub struct Preprocessor {
    bounds: Option<MinMaxBounds>,
}

impl Preprocessor {
    pub fn new(bounds: Option<MinMaxBounds>) -> Self {
        Self { bounds }
    }

    /// Normalise a freshly decoded matrix in place.
    pub fn normalise(&self, format: FeatureFormat, matrix: &mut FeatureMatrix) {
        match format {
            FeatureFormat::Container => {
                matrix.map_in_place(|x| (x + CONTAINER_OFFSET) / CONTAINER_SCALE);
            }
            FeatureFormat::RawBinary => {
                if let Some(b) = self.bounds.filter(MinMaxBounds::is_active) {
                    let min   = b.min as f32;
                    let range = (b.max - b.min) as f32;
                    matrix.map_in_place(|x| (x - min) / range);
                }
            }
            FeatureFormat::Parametric => {
                matrix.map_in_place(|x| x / PARAMETRIC_SCALE);
            }
        }
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(None)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(values: &[f32]) -> FeatureMatrix {
        FeatureMatrix::new(1, values.len(), values.to_vec()).unwrap()
    }

    #[test]
    fn test_container_affine() {
        let mut m = matrix(&[-15.0966, 2.25745]);
        Preprocessor::default().normalise(FeatureFormat::Container, &mut m);
        assert_eq!(m.values()[0], 0.0);
        assert!((m.values()[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_container_scale_is_folded_in_f64() {
        assert_eq!(CONTAINER_SCALE, 17.35405_f64 as f32);
    }

    #[test]
    fn test_raw_binary_without_bounds_passes_through() {
        let mut m = matrix(&[3.0, -7.5]);
        Preprocessor::default().normalise(FeatureFormat::RawBinary, &mut m);
        assert_eq!(m.values(), &[3.0, -7.5]);
    }

    #[test]
    fn test_raw_binary_zero_bound_disables_scaling() {
        let mut m = matrix(&[3.0]);
        let p = Preprocessor::new(Some(MinMaxBounds { min: 0.0, max: 10.0 }));
        p.normalise(FeatureFormat::RawBinary, &mut m);
        assert_eq!(m.values(), &[3.0]);
    }

    #[test]
    fn test_raw_binary_min_max() {
        let mut m = matrix(&[-2.0, 3.0, 8.0]);
        let p = Preprocessor::new(Some(MinMaxBounds { min: -2.0, max: 8.0 }));
        p.normalise(FeatureFormat::RawBinary, &mut m);
        assert_eq!(m.values(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_parametric_scale() {
        let mut m = matrix(&[17.0, -8.5]);
        Preprocessor::default().normalise(FeatureFormat::Parametric, &mut m);
        assert_eq!(m.values(), &[1.0, -0.5]);
    }
}
