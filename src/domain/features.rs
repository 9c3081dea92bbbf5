// ============================================================
// Layer 3 — Feature Matrix Types
// ============================================================
// Two plain containers for spectrogram-like data:
//
//   FeatureMatrix    — what a loader decodes: any number of
//                      frames, each with `bins` values
//   AlignedFeatures  — what the aligner produces: exactly the
//                      configured frame count, plus a unit
//                      channel axis when viewed as a tensor
//
// Both store values row-major, one row per frame:
//   [f0_b0, f0_b1, ..., f0_bF, f1_b0, ..., fL_bF]
//
// Reference: Rust Book §5 (Structs), §8 (Vectors and Slices)

use thiserror::Error;

/// Rejected (frames, bins, values) combination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("a {frames}x{bins} feature matrix cannot hold {len} values")]
pub struct MatrixShapeError {
    pub frames: usize,
    pub bins:   usize,
    pub len:    usize,
}

// ─── FeatureMatrix ────────────────────────────────────────────────────────────
/// A decoded, variable-length feature matrix (frame × frequency bin).
///
/// Always holds at least one frame and one bin.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    frames: usize,
    bins:   usize,
    values: Vec<f32>,
}

impl FeatureMatrix {
    pub fn new(frames: usize, bins: usize, values: Vec<f32>) -> Result<Self, MatrixShapeError> {
        if frames == 0 || bins == 0 || values.len() != frames * bins {
            return Err(MatrixShapeError { frames, bins, len: values.len() });
        }
        Ok(Self { frames, bins, values })
    }

    /// Build a matrix from per-frame rows. All rows must share one length.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, MatrixShapeError> {
        let bins = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != bins) {
            let len = rows.iter().map(Vec::len).sum();
            return Err(MatrixShapeError { frames: rows.len(), bins, len });
        }
        Self::new(rows.len(), bins, rows.concat())
    }

    pub fn frames(&self) -> usize { self.frames }

    pub fn bins(&self) -> usize { self.bins }

    pub fn values(&self) -> &[f32] { &self.values }

    /// One frame as a slice of `bins` values
    pub fn frame(&self, index: usize) -> &[f32] {
        &self.values[index * self.bins..(index + 1) * self.bins]
    }

    /// Frames `[start, end)` as one contiguous slice
    pub fn frame_range(&self, start: usize, end: usize) -> &[f32] {
        &self.values[start * self.bins..end * self.bins]
    }

    /// Apply `f` to every value in place
    pub fn map_in_place(&mut self, f: impl Fn(f32) -> f32) {
        self.values.iter_mut().for_each(|v| *v = f(*v));
    }

    /// (min, max, mean) over all values
    pub fn summary(&self) -> (f32, f32, f32) {
        summarise(&self.values)
    }
}

// ─── AlignedFeatures ──────────────────────────────────────────────────────────
/// A fixed-length tensor of shape (frames, bins, 1).
///
/// Only the aligner and the augmenters create these, so every
/// instance flowing through a batch has the configured frame count.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFeatures {
    frames: usize,
    bins:   usize,
    values: Vec<f32>,
}

impl AlignedFeatures {
    pub(crate) fn from_values(frames: usize, bins: usize, values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), frames * bins);
        Self { frames, bins, values }
    }

    pub fn frames(&self) -> usize { self.frames }

    pub fn bins(&self) -> usize { self.bins }

    /// Tensor shape including the trailing channel axis
    pub fn shape(&self) -> [usize; 3] {
        [self.frames, self.bins, 1]
    }

    pub fn values(&self) -> &[f32] { &self.values }

    pub fn frame(&self, index: usize) -> &[f32] {
        &self.values[index * self.bins..(index + 1) * self.bins]
    }

    /// Circularly shift the tensor: value at (f, b) moves to
    /// ((f + frame_shift) mod frames, (b + bin_shift) mod bins).
    /// Values pushed off one edge wrap around to the other.
    pub fn rolled(&self, frame_shift: isize, bin_shift: isize) -> Self {
        let frames = self.frames as isize;
        let bins   = self.bins as isize;
        let mut out = vec![0.0f32; self.values.len()];

        for f in 0..frames {
            let dst_f = (f + frame_shift).rem_euclid(frames);
            for b in 0..bins {
                let dst_b = (b + bin_shift).rem_euclid(bins);
                out[(dst_f * bins + dst_b) as usize] = self.values[(f * bins + b) as usize];
            }
        }

        Self::from_values(self.frames, self.bins, out)
    }

    /// (min, max, mean) over all values
    pub fn summary(&self) -> (f32, f32, f32) {
        summarise(&self.values)
    }
}

/// (min, max, mean) of a value slice; the mean is accumulated in f64
pub fn summarise(values: &[f32]) -> (f32, f32, f32) {
    let (min, max, sum) = values.iter().fold(
        (f32::INFINITY, f32::NEG_INFINITY, 0.0f64),
        |(lo, hi, s), &v| (lo.min(v), hi.max(v), s + v as f64),
    );
    (min, max, (sum / values.len().max(1) as f64) as f32)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(FeatureMatrix::new(2, 3, vec![0.0; 5]).is_err());
        assert!(FeatureMatrix::new(0, 3, vec![]).is_err());
        assert!(FeatureMatrix::new(2, 3, vec![0.0; 6]).is_ok());
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(FeatureMatrix::from_rows(&rows).is_err());
    }

    #[test]
    fn test_frame_access() {
        let m = FeatureMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.frame(1), &[3.0, 4.0]);
        assert_eq!(m.frame_range(0, 2), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rolled_wraps_both_axes() {
        // 3 frames x 2 bins: value = 10 * frame + bin
        let t = AlignedFeatures::from_values(3, 2, vec![0.0, 1.0, 10.0, 11.0, 20.0, 21.0]);
        let r = t.rolled(1, 1);
        // frame 2 wraps to frame 0, bin 1 wraps to bin 0
        assert_eq!(r.frame(0), &[21.0, 20.0]);
        assert_eq!(r.frame(1), &[1.0, 0.0]);
        assert_eq!(r.frame(2), &[11.0, 10.0]);
    }

    #[test]
    fn test_rolled_negative_shift() {
        let t = AlignedFeatures::from_values(3, 1, vec![0.0, 1.0, 2.0]);
        assert_eq!(t.rolled(-1, 0).values(), &[1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_summary() {
        let t = AlignedFeatures::from_values(2, 2, vec![1.0, 2.0, 3.0, 6.0]);
        assert_eq!(t.summary(), (1.0, 6.0, 3.0));
    }
}
