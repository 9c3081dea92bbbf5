// ============================================================
// Layer 4 — Id Sequence
// ============================================================
// The ordered list of sample ids a stream walks through.
//
// Loaded once from a newline-delimited list file:
//
//   BirdVox-DCASE-20k/00053d90-e4b9-4045-a2f1-f39efc90cfa9.wav
//   warblrb10k/759808e5-f824-401e-9058.wav
//   ...
//
// Trailing whitespace (including '\r') is stripped from every
// line and blank lines are skipped. After loading, the list only
// ever changes order (shuffle); it never grows or shrinks.
//
// Shuffling is a Fisher-Yates pass via rand::seq::SliceRandom,
// driven by the caller's RNG so seeded runs are reproducible.
//
// Reference: Burn Book §4 (Dataset trait)
//            rand crate documentation

use burn::data::dataset::Dataset;
use rand::{seq::SliceRandom, Rng};
use std::{fs, path::Path};

use crate::domain::error::{PipelineError, Result};
use crate::domain::sample::SampleId;

#[derive(Debug, Clone)]
pub struct IdSequence {
    ids: Vec<SampleId>,
}

impl IdSequence {
    pub fn new(ids: Vec<SampleId>) -> Self { Self { ids } }

    /// Read an id list file. Unreadable or empty lists are rejected.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| PipelineError::IdList {
            path:   path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let ids: Vec<SampleId> = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .map(SampleId::from)
            .collect();

        if ids.is_empty() {
            return Err(PipelineError::IdList {
                path:   path.to_path_buf(),
                reason: "list contains no ids".into(),
            });
        }

        tracing::debug!("Loaded {} ids from '{}'", ids.len(), path.display());
        Ok(Self { ids })
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.ids.shuffle(rng);
    }

    pub fn id_count(&self) -> usize { self.ids.len() }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[SampleId] { &self.ids }
}

impl Dataset<SampleId> for IdSequence {
    fn get(&self, index: usize) -> Option<SampleId> {
        self.ids.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn ids(names: &[&str]) -> IdSequence {
        IdSequence::new(names.iter().map(|n| SampleId::from(*n)).collect())
    }

    #[test]
    fn test_from_file_strips_and_skips_blanks() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("val_B");
        fs::write(&path, "a.wav  \r\n\nb.wav\n   \nc.wav").unwrap();

        let seq = IdSequence::from_file(&path).unwrap();
        let got: Vec<&str> = seq.as_slice().iter().map(SampleId::as_str).collect();
        assert_eq!(got, vec!["a.wav", "b.wav", "c.wav"]);
    }

    #[test]
    fn test_from_file_rejects_empty_list() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty");
        fs::write(&path, "\n\n").unwrap();
        assert!(matches!(IdSequence::from_file(&path), Err(PipelineError::IdList { .. })));
    }

    #[test]
    fn test_from_file_missing() {
        let err = IdSequence::from_file(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, PipelineError::IdList { .. }));
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut seq = ids(&["a", "b", "c", "d", "e", "f"]);
        seq.shuffle(&mut StdRng::seed_from_u64(42));

        let mut sorted: Vec<_> = seq.as_slice().to_vec();
        sorted.sort();
        assert_eq!(sorted, ids(&["a", "b", "c", "d", "e", "f"]).as_slice());
        assert_eq!(seq.id_count(), 6);
    }

    #[test]
    fn test_dataset_trait() {
        let seq = ids(&["x", "y"]);
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.get(1), Some(SampleId::from("y")));
        assert_eq!(seq.get(2), None);
    }
}
