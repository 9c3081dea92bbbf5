// ============================================================
// Layer 4 — Feature Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<Example> into
// tensors the classifier can consume.
//
// How batching works here:
//   Input:  N examples, each an aligned (T0, F, 1) tensor
//   Output: TensorBatch with
//             features [N, T0, F, 1]  (float)
//             labels   [N, 1]         (float, None in predict)
//
//   Every example already has the same shape (the aligner
//   guarantees it), so the values are simply concatenated:
//   [e1_f0_b0, ..., e1_fT_bF, e2_f0_b0, ..., eN_fT_bF]
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::Example;

// ─── TensorBatch ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TensorBatch<B: Backend> {
    /// shape: [batch_size, frames, bins, 1]
    pub features: Tensor<B, 4>,

    /// shape: [batch_size, 1]; 1.0 = bird present.
    /// `None` when any example carries no label.
    pub labels: Option<Tensor<B, 2>>,
}

// ─── FeatureBatcher ───────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct FeatureBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> FeatureBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<Example, TensorBatch<B>> for FeatureBatcher<B> {
    fn batch(&self, items: Vec<Example>) -> TensorBatch<B> {
        let batch_size = items.len();
        let [frames, bins, channels] = items
            .first()
            .map_or([0, 0, 1], |e| e.features.shape());

        // ── Flatten features ──
        let flat: Vec<f32> = items
            .iter()
            .flat_map(|e| e.features.values().iter().copied())
            .collect();

        let features = Tensor::<B, 4>::from_data(
            TensorData::new(flat, [batch_size, frames, bins, channels]),
            &self.device,
        );

        // ── Labels, only if every example has one ──
        let labels = items
            .iter()
            .map(|e| e.label.map(|l| l.as_f32()))
            .collect::<Option<Vec<f32>>>()
            .filter(|l| !l.is_empty())
            .map(|l| {
                Tensor::<B, 2>::from_data(TensorData::new(l, [batch_size, 1]), &self.device)
            });

        TensorBatch { features, labels }
    }
}
