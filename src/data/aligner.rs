// ============================================================
// Layer 4 — Temporal Aligner
// ============================================================
// Forces every feature matrix to exactly `target_frames` frames
// so the classifier sees a fixed input shape.
//
// With L input frames, T0 target frames and diff = |L - T0|:
//
//   L == T0        → unchanged
//   L <  T0, small → input, then its last `diff` frames again
//   L <  T0, large → input repeated floor(T0/L) times, then the
//                    last T0 mod L frames
//   L >  T0, small → the first diff+1 frames are blended with
//                    the last diff+1 frames, the rest is copied
//   L >  T0, large → T0-frame blocks are averaged, then the
//                    leftover tail is blended onto the front
//
// "small" means 2·diff <= T0. The boundary case 2·diff == T0
// takes the small branch for both padding and shrinking.
//
//   L=7, T0=10:  0 1 2 3 4 5 6 | 4 5 6
//   L=3, T0=10:  0 1 2 | 0 1 2 | 0 1 2 | 2
//
// Reference: Rust Book §8 (Vectors and Slices)

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::error::{PipelineError, Result};
use crate::domain::features::{AlignedFeatures, FeatureMatrix};

// ─── ShrinkFidelity ───────────────────────────────────────────────────────────
/// How the large-shrink branch combines blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShrinkFidelity {
    /// Plain mean of the blocks, then one tail blend
    #[default]
    BlockMean,
    /// Running `acc = (acc + block) / count` with the tail blended
    /// after every block. Matches the numbers produced by the
    /// feature sets already used to train existing models.
    Reference,
}

impl FromStr for ShrinkFidelity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "block-mean" | "mean" => Ok(ShrinkFidelity::BlockMean),
            "reference"           => Ok(ShrinkFidelity::Reference),
            other => Err(format!("unknown shrink fidelity '{other}' (block-mean, reference)")),
        }
    }
}

// ─── TemporalAligner ──────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TemporalAligner {
    target_frames: usize,
    fidelity:      ShrinkFidelity,
}

impl TemporalAligner {
    pub fn new(target_frames: usize) -> Result<Self> {
        if target_frames == 0 {
            return Err(PipelineError::InvalidConfig(
                "target frame count must be at least 1".into(),
            ));
        }
        Ok(Self { target_frames, fidelity: ShrinkFidelity::default() })
    }

    pub fn with_fidelity(mut self, fidelity: ShrinkFidelity) -> Self {
        self.fidelity = fidelity;
        self
    }

    pub fn target_frames(&self) -> usize {
        self.target_frames
    }

    /// Resize `matrix` to `target_frames` frames. Bins are untouched.
    pub fn align(&self, matrix: &FeatureMatrix) -> AlignedFeatures {
        let len    = matrix.frames();
        let target = self.target_frames;
        let diff   = len.abs_diff(target);
        let small  = 2 * diff <= target;

        let values = if len == target {
            matrix.values().to_vec()
        } else if len < target {
            if small { pad_tail(matrix, diff) } else { pad_repeat(matrix, target) }
        } else if small {
            shrink_blend(matrix, target, diff)
        } else {
            match self.fidelity {
                ShrinkFidelity::BlockMean => shrink_block_mean(matrix, target),
                ShrinkFidelity::Reference => shrink_reference(matrix, target),
            }
        };

        AlignedFeatures::from_values(target, matrix.bins(), values)
    }
}

// ─── Padding ──────────────────────────────────────────────────────────────────

fn pad_tail(matrix: &FeatureMatrix, diff: usize) -> Vec<f32> {
    let len = matrix.frames();
    let mut out = Vec::with_capacity((len + diff) * matrix.bins());
    out.extend_from_slice(matrix.values());
    out.extend_from_slice(matrix.frame_range(len - diff, len));
    out
}

fn pad_repeat(matrix: &FeatureMatrix, target: usize) -> Vec<f32> {
    let len       = matrix.frames();
    let count     = target / len;
    let remainder = target - len * count;

    let mut out = matrix.values().repeat(count);
    out.extend_from_slice(matrix.frame_range(len - remainder, len));
    out
}

// ─── Shrinking ────────────────────────────────────────────────────────────────

fn shrink_blend(matrix: &FeatureMatrix, target: usize, diff: usize) -> Vec<f32> {
    let len  = matrix.frames();
    let head = diff + 1;

    let front = matrix.frame_range(0, head);
    let back  = matrix.frame_range(len - head, len);

    let mut out: Vec<f32> = front.iter().zip(back).map(|(a, b)| (a + b) / 2.0).collect();
    out.extend_from_slice(matrix.frame_range(head, target));
    out
}

fn shrink_block_mean(matrix: &FeatureMatrix, target: usize) -> Vec<f32> {
    let len       = matrix.frames();
    let bins      = matrix.bins();
    let count     = len / target;
    let remainder = len - target * count;

    // ── Step 1: sum the blocks ──
    let mut acc = vec![0.0f64; target * bins];
    for k in 0..count {
        let block = matrix.frame_range(k * target, (k + 1) * target);
        acc.iter_mut().zip(block).for_each(|(a, &v)| *a += v as f64);
    }
    acc.iter_mut().for_each(|a| *a /= count as f64);

    // ── Step 2: blend the leftover tail onto the front ──
    let tail = matrix.frame_range(len - remainder, len);
    acc.iter_mut().zip(tail).for_each(|(a, &t)| *a = (t as f64 + *a) / 2.0);

    acc.into_iter().map(|v| v as f32).collect()
}

fn shrink_reference(matrix: &FeatureMatrix, target: usize) -> Vec<f32> {
    let len       = matrix.frames();
    let bins      = matrix.bins();
    let count     = len / target;
    let remainder = len - target * count;
    let tail      = matrix.frame_range(len - remainder, len);

    let mut acc = vec![0.0f64; target * bins];
    for k in 0..count {
        let block = matrix.frame_range(k * target, (k + 1) * target);
        acc.iter_mut()
            .zip(block)
            .for_each(|(a, &v)| *a = (*a + v as f64) / count as f64);
        acc.iter_mut().zip(tail).for_each(|(a, &t)| *a = (t as f64 + *a) / 2.0);
    }

    acc.into_iter().map(|v| v as f32).collect()
}
