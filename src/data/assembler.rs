// ============================================================
// Layer 4 — Batch Assembler
// ============================================================
// The cyclic, stateful generator that turns an id list into an
// endless stream of fixed-size batches.
//
// For every pull:
//
//   while fewer than N examples are pending:
//       advance the cursor (wrap → new pass, reshuffle if enabled)
//       load + normalise   (FeatureSource)
//       align to T0 frames (TemporalAligner)
//       attach the label   (LabelSource, train/eval only)
//       expand to A examples: the sample, then A-1 replicas
//   emit exactly N pending examples, keep the rest for next pull
//
// With ids [a, b, c, d, e] and N = 2 the stream is
//   [a, b], [c, d], [e, a], [b, c], ...
// Batches straddle pass boundaries; no batch is ever partial.
//
// Every random draw (shuffle and augmentation) comes from one
// StdRng seeded at construction, so a stream is reproducible.
//
// The first error ends the stream: the Iterator impl yields it
// once and then returns None forever.
//
// Reference: Rust Book §13.2 (Implementing the Iterator Trait)
//            Rust Book §17 (Trait Objects)

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    prelude::Backend,
};
use rand::{rngs::StdRng, SeedableRng};
use std::collections::VecDeque;

use crate::data::aligner::{ShrinkFidelity, TemporalAligner};
use crate::data::augment::ShiftAugmenter;
use crate::data::batcher::{FeatureBatcher, TensorBatch};
use crate::data::dataset::IdSequence;
use crate::domain::error::{PipelineError, Result};
use crate::domain::sample::{Example, Label, Mode, SampleId};
use crate::domain::traits::{Augmenter, FeatureSource, LabelSource};

// ─── CursorState ──────────────────────────────────────────────────────────────
/// Where the assembler is in its id list.
#[derive(Debug, Clone, Default)]
pub struct CursorState {
    /// Index of the last visited id; `None` before the first pull
    position: Option<usize>,
    /// Passes started so far, counting the one in progress
    passes:   usize,
    shuffle:  bool,
}

impl CursorState {
    fn new(shuffle: bool) -> Self {
        Self { position: None, passes: 0, shuffle }
    }

    /// Step to the next index. Returns it together with whether
    /// the cursor just wrapped to the start of a new pass.
    fn advance(&mut self, len: usize) -> (usize, bool) {
        let next = self.position.map_or(0, |p| (p + 1) % len);
        self.position = Some(next);
        let wrapped = next == 0;
        if wrapped {
            self.passes += 1;
        }
        (next, wrapped)
    }

    pub fn position(&self) -> Option<usize> { self.position }

    pub fn passes(&self) -> usize { self.passes }

    pub fn shuffle(&self) -> bool { self.shuffle }
}

// ─── FeatureBatch ─────────────────────────────────────────────────────────────
/// Exactly N examples in emission order.
#[derive(Debug, Clone)]
pub struct FeatureBatch {
    examples: Vec<Example>,
    mode:     Mode,
}

impl FeatureBatch {
    pub fn examples(&self) -> &[Example] { &self.examples }

    pub fn mode(&self) -> Mode { self.mode }

    pub fn len(&self) -> usize { self.examples.len() }

    pub fn is_empty(&self) -> bool { self.examples.is_empty() }

    pub fn ids(&self) -> Vec<&SampleId> {
        self.examples.iter().map(|e| &e.id).collect()
    }

    /// `None` for predict batches, which carry no labels
    pub fn labels(&self) -> Option<Vec<Label>> {
        if !self.mode.requires_labels() {
            return None;
        }
        self.examples.iter().map(|e| e.label).collect()
    }

    /// Stack the batch into `[N, T0, F, 1]` features and `[N, 1]` labels
    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> TensorBatch<B> {
        FeatureBatcher::<B>::new(device.clone()).batch(self.examples.clone())
    }
}

// ─── AssemblerBuilder ─────────────────────────────────────────────────────────
/// Chained-setter construction of a [`BatchAssembler`].
///
/// ```ignore
/// let assembler = BatchAssembler::builder(ids, Box::new(loader), Mode::Train)
///     .labels(Box::new(table))
///     .batch_size(16)
///     .augment_multiplier(4)
///     .seed(42)
///     .build()?;
/// ```
pub struct AssemblerBuilder {
    ids:                IdSequence,
    features:           Box<dyn FeatureSource>,
    mode:               Mode,
    labels:             Option<Box<dyn LabelSource>>,
    augmenter:          Box<dyn Augmenter>,
    batch_size:         usize,
    augment_multiplier: usize,
    shuffle:            Option<bool>,
    seed:               u64,
    target_frames:      usize,
    bins:               usize,
    fidelity:           ShrinkFidelity,
}

impl AssemblerBuilder {
    fn new(ids: IdSequence, features: Box<dyn FeatureSource>, mode: Mode) -> Self {
        Self {
            ids,
            features,
            mode,
            labels:             None,
            augmenter:          Box::new(ShiftAugmenter::default()),
            batch_size:         16,
            augment_multiplier: 1,
            shuffle:            None,
            seed:               42,
            target_frames:      1000,
            bins:               180,
            fidelity:           ShrinkFidelity::default(),
        }
    }

    pub fn labels(mut self, labels: Box<dyn LabelSource>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn augmenter(mut self, augmenter: Box<dyn Augmenter>) -> Self {
        self.augmenter = augmenter;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn augment_multiplier(mut self, multiplier: usize) -> Self {
        self.augment_multiplier = multiplier;
        self
    }

    /// Defaults to shuffling in train mode only
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = Some(shuffle);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn target_frames(mut self, frames: usize) -> Self {
        self.target_frames = frames;
        self
    }

    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn fidelity(mut self, fidelity: ShrinkFidelity) -> Self {
        self.fidelity = fidelity;
        self
    }

    pub fn build(self) -> Result<BatchAssembler> {
        if self.ids.id_count() == 0 {
            return Err(PipelineError::InvalidConfig("id list is empty".into()));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidConfig("batch size must be at least 1".into()));
        }
        if self.augment_multiplier == 0 {
            return Err(PipelineError::InvalidConfig(
                "augment multiplier must be at least 1".into(),
            ));
        }
        if self.bins == 0 {
            return Err(PipelineError::InvalidConfig("bin count must be at least 1".into()));
        }
        if self.mode.requires_labels() && self.labels.is_none() {
            return Err(PipelineError::InvalidConfig(format!(
                "{} mode needs a label source",
                self.mode
            )));
        }

        let aligner = TemporalAligner::new(self.target_frames)?.with_fidelity(self.fidelity);

        let shuffle = self.shuffle.unwrap_or(self.mode == Mode::Train);

        tracing::info!(
            "Assembler ready: {} ids, mode {}, batch {}, x{} augmentation, shuffle {}",
            self.ids.id_count(),
            self.mode,
            self.batch_size,
            self.augment_multiplier,
            shuffle
        );

        Ok(BatchAssembler {
            ids: self.ids,
            cursor: CursorState::new(shuffle),
            features: self.features,
            labels: self.labels,
            augmenter: self.augmenter,
            aligner,
            mode: self.mode,
            batch_size: self.batch_size,
            augment_multiplier: self.augment_multiplier,
            bins: self.bins,
            rng: StdRng::seed_from_u64(self.seed),
            pending: VecDeque::new(),
            failed: false,
        })
    }
}

// ─── BatchAssembler ───────────────────────────────────────────────────────────
pub struct BatchAssembler {
    ids:                IdSequence,
    cursor:             CursorState,
    features:           Box<dyn FeatureSource>,
    labels:             Option<Box<dyn LabelSource>>,
    augmenter:          Box<dyn Augmenter>,
    aligner:            TemporalAligner,
    mode:               Mode,
    batch_size:         usize,
    augment_multiplier: usize,
    bins:               usize,
    rng:                StdRng,
    pending:            VecDeque<Example>,
    failed:             bool,
}

impl BatchAssembler {
    pub fn builder(ids: IdSequence, features: Box<dyn FeatureSource>, mode: Mode) -> AssemblerBuilder {
        AssemblerBuilder::new(ids, features, mode)
    }

    /// Passes over the id list started so far
    pub fn passes(&self) -> usize { self.cursor.passes() }

    pub fn cursor(&self) -> &CursorState { &self.cursor }

    pub fn mode(&self) -> Mode { self.mode }

    /// Length of the id list being cycled
    pub fn id_count(&self) -> usize { self.ids.id_count() }

    pub fn batch_size(&self) -> usize { self.batch_size }

    /// Examples already produced but not yet emitted
    pub fn pending(&self) -> usize { self.pending.len() }

    /// Pull the next full batch.
    pub fn next_batch(&mut self) -> Result<FeatureBatch> {
        while self.pending.len() < self.batch_size {
            let id = self.advance()?;
            let examples = self.examples_for(id)?;
            self.pending.extend(examples);
        }

        let examples: Vec<Example> = self.pending.drain(..self.batch_size).collect();
        tracing::debug!(
            "Emitted {} batch of {} ({} pending, pass {})",
            self.mode,
            examples.len(),
            self.pending.len(),
            self.cursor.passes()
        );
        Ok(FeatureBatch { examples, mode: self.mode })
    }

    fn advance(&mut self) -> Result<SampleId> {
        let (index, wrapped) = self.cursor.advance(self.ids.len());
        if wrapped && self.cursor.shuffle() {
            self.ids.shuffle(&mut self.rng);
            tracing::debug!("Reshuffled {} ids for pass {}", self.ids.len(), self.cursor.passes());
        }
        self.ids.get(index).ok_or_else(|| {
            PipelineError::InvalidConfig(format!("cursor {index} is past the end of the id list"))
        })
    }

    /// Load, align and label one id, then expand it into
    /// `augment_multiplier` examples.
    fn examples_for(&mut self, id: SampleId) -> Result<Vec<Example>> {
        let target = self.aligner.target_frames();

        // ── Step 1: load ──
        let matrix = self.features.load(&id)?;
        if matrix.bins() != self.bins {
            return Err(PipelineError::ShapeMismatch {
                id:       id.to_string(),
                expected: (target, self.bins),
                actual:   (matrix.frames(), matrix.bins()),
            });
        }

        // ── Step 2: align ──
        let aligned = self.aligner.align(&matrix);
        if aligned.frames() != target || aligned.bins() != self.bins {
            return Err(PipelineError::ShapeMismatch {
                id:       id.to_string(),
                expected: (target, self.bins),
                actual:   (aligned.frames(), aligned.bins()),
            });
        }

        // ── Step 3: label ──
        let label = match (&self.labels, self.mode.requires_labels()) {
            (Some(labels), true) => Some(
                labels
                    .resolve(&id)
                    .ok_or_else(|| PipelineError::LabelNotFound { id: id.to_string() })?,
            ),
            _ => None,
        };

        // ── Step 4: replicate ──
        let mut out = Vec::with_capacity(self.augment_multiplier);
        for _ in 1..self.augment_multiplier {
            let features = self.augmenter.augment(&aligned, &mut self.rng);
            out.push(Example { id: id.clone(), features, label, augmented: true });
        }
        out.insert(0, Example { id, features: aligned, label, augmented: false });

        Ok(out)
    }
}

impl Iterator for BatchAssembler {
    type Item = Result<FeatureBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_batch() {
            Ok(batch) => Some(Ok(batch)),
            Err(e) => {
                tracing::error!("Batch stream stopped: {e}");
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for BatchAssembler {}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::FeatureMatrix;
    use std::collections::HashMap;

    /// Every id maps to a `frames x bins` ramp; ids in `missing` fail.
    struct MemorySource {
        frames:  usize,
        bins:    usize,
        missing: Vec<&'static str>,
    }

    impl MemorySource {
        fn new(frames: usize, bins: usize) -> Box<Self> {
            Box::new(Self { frames, bins, missing: Vec::new() })
        }
    }

    impl FeatureSource for MemorySource {
        fn load(&self, id: &SampleId) -> Result<FeatureMatrix> {
            if self.missing.contains(&id.as_str()) {
                return Err(PipelineError::Decode {
                    path:   id.as_str().into(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound).into(),
                });
            }
            let n = self.frames * self.bins;
            Ok(FeatureMatrix::new(self.frames, self.bins, (0..n).map(|i| i as f32).collect()).unwrap())
        }
    }

    struct MapLabels(HashMap<SampleId, Label>);

    impl LabelSource for MapLabels {
        fn resolve(&self, id: &SampleId) -> Option<Label> {
            self.0.get(id).copied()
        }
    }

    fn ids(names: &[&str]) -> IdSequence {
        IdSequence::new(names.iter().map(|n| SampleId::from(*n)).collect())
    }

    fn all_labelled(names: &[&str]) -> Box<MapLabels> {
        Box::new(MapLabels(
            names.iter().map(|n| (SampleId::from(*n), Label::PRESENT)).collect(),
        ))
    }

    fn names(batch: &FeatureBatch) -> Vec<&str> {
        batch.ids().into_iter().map(SampleId::as_str).collect()
    }

    const ABCDE: [&str; 5] = ["a", "b", "c", "d", "e"];

    fn eval_assembler(batch_size: usize) -> BatchAssembler {
        BatchAssembler::builder(ids(&ABCDE), MemorySource::new(6, 2), Mode::Eval)
            .labels(all_labelled(&ABCDE))
            .batch_size(batch_size)
            .target_frames(4)
            .bins(2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_batches_straddle_pass_boundary() {
        let mut asm = eval_assembler(2);
        let got: Vec<Vec<String>> = (0..4)
            .map(|_| {
                let b = asm.next_batch().unwrap();
                names(&b).into_iter().map(String::from).collect()
            })
            .collect();
        assert_eq!(got, vec![vec!["a", "b"], vec!["c", "d"], vec!["e", "a"], vec!["b", "c"]]);
        assert_eq!(asm.passes(), 2);
    }

    #[test]
    fn test_one_pass_visits_every_id_in_order() {
        let mut asm = eval_assembler(1);
        let visited: Vec<String> = (0..5)
            .map(|_| names(&asm.next_batch().unwrap())[0].to_string())
            .collect();
        assert_eq!(visited, ABCDE);
        assert_eq!(asm.passes(), 1);
        assert_eq!(asm.cursor().position(), Some(4));
    }

    #[test]
    fn test_batches_always_have_n_examples_of_target_shape() {
        let mut asm = eval_assembler(3);
        for batch in asm.by_ref().take(7) {
            let batch = batch.unwrap();
            assert_eq!(batch.len(), 3);
            for e in batch.examples() {
                assert_eq!(e.features.shape(), [4, 2, 1]);
            }
        }
    }

    #[test]
    fn test_shuffle_is_reproducible_and_per_pass() {
        let build = |seed| {
            BatchAssembler::builder(ids(&ABCDE), MemorySource::new(4, 2), Mode::Train)
                .labels(all_labelled(&ABCDE))
                .batch_size(5)
                .target_frames(4)
                .bins(2)
                .seed(seed)
                .build()
                .unwrap()
        };

        let mut a = build(9);
        let mut b = build(9);
        for _ in 0..3 {
            let ba = a.next_batch().unwrap();
            let bb = b.next_batch().unwrap();
            assert_eq!(names(&ba), names(&bb));

            // one batch == one full pass: every id exactly once
            let mut pass = names(&ba);
            pass.sort();
            assert_eq!(pass, ABCDE);
        }
        assert_eq!(a.passes(), 3);
    }

    #[test]
    fn test_shuffle_defaults_by_mode() {
        let train = BatchAssembler::builder(ids(&ABCDE), MemorySource::new(4, 2), Mode::Train)
            .labels(all_labelled(&ABCDE))
            .bins(2)
            .build()
            .unwrap();
        assert!(train.cursor().shuffle());
        assert!(!eval_assembler(2).cursor().shuffle());
    }

    #[test]
    fn test_augmented_examples_carry_over() {
        let names3 = ["a", "b", "c"];
        let mut asm = BatchAssembler::builder(ids(&names3), MemorySource::new(4, 2), Mode::Train)
            .labels(all_labelled(&names3))
            .shuffle(false)
            .batch_size(2)
            .augment_multiplier(3)
            .target_frames(4)
            .bins(2)
            .build()
            .unwrap();

        let flags = |b: &FeatureBatch| b.examples().iter().map(|e| e.augmented).collect::<Vec<_>>();

        let b1 = asm.next_batch().unwrap();
        assert_eq!(names(&b1), vec!["a", "a"]);
        assert_eq!(flags(&b1), vec![false, true]);
        assert_eq!(asm.pending(), 1);

        let b2 = asm.next_batch().unwrap();
        assert_eq!(names(&b2), vec!["a", "b"]);
        assert_eq!(flags(&b2), vec![true, false]);

        // third batch is served from the buffer alone
        let b3 = asm.next_batch().unwrap();
        assert_eq!(names(&b3), vec!["b", "b"]);
        assert_eq!(flags(&b3), vec![true, true]);
        assert_eq!(asm.cursor().position(), Some(1));
    }

    #[test]
    fn test_multiplier_applies_in_every_mode() {
        let mut asm = BatchAssembler::builder(ids(&ABCDE), MemorySource::new(4, 2), Mode::Predict)
            .augment_multiplier(2)
            .batch_size(4)
            .target_frames(4)
            .bins(2)
            .build()
            .unwrap();
        let batch = asm.next_batch().unwrap();
        assert_eq!(names(&batch), vec!["a", "a", "b", "b"]);
        assert_eq!(batch.examples().iter().filter(|e| e.augmented).count(), 2);
    }

    #[test]
    fn test_missing_label_is_fatal_in_eval() {
        let mut labels = HashMap::new();
        labels.insert(SampleId::from("a"), Label::ABSENT);
        let mut asm = BatchAssembler::builder(ids(&["a", "b"]), MemorySource::new(4, 2), Mode::Eval)
            .labels(Box::new(MapLabels(labels)))
            .batch_size(2)
            .target_frames(4)
            .bins(2)
            .build()
            .unwrap();
        assert!(matches!(
            asm.next_batch(),
            Err(PipelineError::LabelNotFound { id }) if id == "b"
        ));
    }

    #[test]
    fn test_predict_needs_no_labels() {
        let mut asm = BatchAssembler::builder(ids(&["x", "y"]), MemorySource::new(9, 2), Mode::Predict)
            .batch_size(2)
            .target_frames(4)
            .bins(2)
            .build()
            .unwrap();
        let batch = asm.next_batch().unwrap();
        assert_eq!(batch.labels(), None);
        assert!(batch.examples().iter().all(|e| e.label.is_none()));
    }

    #[test]
    fn test_eval_batch_labels() {
        let batch = eval_assembler(2).next_batch().unwrap();
        assert_eq!(batch.labels(), Some(vec![Label::PRESENT, Label::PRESENT]));
    }

    #[test]
    fn test_wrong_bin_count_is_shape_mismatch() {
        let mut asm = BatchAssembler::builder(ids(&["a"]), MemorySource::new(4, 3), Mode::Predict)
            .batch_size(1)
            .target_frames(4)
            .bins(2)
            .build()
            .unwrap();
        assert!(matches!(
            asm.next_batch(),
            Err(PipelineError::ShapeMismatch { expected: (4, 2), actual: (4, 3), .. })
        ));
    }

    #[test]
    fn test_stream_is_fused_after_error() {
        let source = Box::new(MemorySource { frames: 4, bins: 2, missing: vec!["b"] });
        let mut asm = BatchAssembler::builder(ids(&["a", "b", "c"]), source, Mode::Predict)
            .batch_size(1)
            .target_frames(4)
            .bins(2)
            .build()
            .unwrap();
        assert!(matches!(asm.next(), Some(Ok(_))));
        assert!(matches!(asm.next(), Some(Err(PipelineError::Decode { .. }))));
        assert!(asm.next().is_none());
        assert!(asm.next().is_none());
    }

    #[test]
    fn test_build_rejects_bad_parameters() {
        let empty = BatchAssembler::builder(IdSequence::new(vec![]), MemorySource::new(4, 2), Mode::Predict)
            .build();
        assert!(matches!(empty, Err(PipelineError::InvalidConfig(_))));

        let zero_n = BatchAssembler::builder(ids(&["a"]), MemorySource::new(4, 2), Mode::Predict)
            .batch_size(0)
            .build();
        assert!(matches!(zero_n, Err(PipelineError::InvalidConfig(_))));

        let zero_a = BatchAssembler::builder(ids(&["a"]), MemorySource::new(4, 2), Mode::Predict)
            .augment_multiplier(0)
            .build();
        assert!(matches!(zero_a, Err(PipelineError::InvalidConfig(_))));

        let unlabelled = BatchAssembler::builder(ids(&["a"]), MemorySource::new(4, 2), Mode::Train)
            .build();
        assert!(matches!(unlabelled, Err(PipelineError::InvalidConfig(_))));
    }
}
