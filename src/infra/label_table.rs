// ============================================================
// Layer 6 — Label Tables
// ============================================================
// Builds the id → label lookup from one or more CSV tables.
//
// Table layout (header row skipped):
//
//   itemid,datasetid,hasbird
//   00053d90-e4b9-4045-a2f1-f39efc90cfa9,BirdVox-DCASE-20k,1
//   ...
//
// Fields may be quoted and padded with spaces. Each row becomes
// the lookup key
//
//   <datasetid>/<itemid><suffix>
//
// where the suffix is ".wav" for train/eval and empty for
// predict, matching how the id lists of each split are written.
// When several tables define the same key, the later table wins.
//
// Reference: Rust Book §8.3 (Hash Maps)
//            Rust Book §9 (Error Handling)

use std::{collections::HashMap, fs::File, io::Read, path::Path};

use crate::domain::error::{PipelineError, Result};
use crate::domain::sample::{Label, Mode, SampleId};
use crate::domain::traits::LabelSource;

#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: HashMap<SampleId, Label>,
}

impl LabelTable {
    /// Load and merge `paths` in order, keyed for `mode`.
    pub fn load<P: AsRef<Path>>(paths: &[P], mode: Mode) -> Result<Self> {
        let mut table = Self::default();
        for path in paths {
            let path = path.as_ref();
            let file = File::open(path).map_err(|e| PipelineError::LabelTable {
                path:   path.to_path_buf(),
                line:   0,
                reason: e.to_string(),
            })?;

            let rows = table.merge_csv(file, mode, path)?;
            if rows == 0 {
                tracing::warn!("Label table '{}' has no rows", path.display());
            } else {
                tracing::debug!("Read {} labels from '{}'", rows, path.display());
            }
        }

        tracing::info!("Label lookup holds {} entries ({} keys)", table.len(), mode);
        Ok(table)
    }

    /// Build a table from (key, group, label) rows already in memory
    #[cfg(test)]
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = (&'a str, &'a str, Label)>, mode: Mode) -> Self {
        let labels = rows
            .into_iter()
            .map(|(key, group, label)| (Self::compose_key(key, group, mode), label))
            .collect();
        Self { labels }
    }

    pub fn len(&self) -> usize { self.labels.len() }

    pub fn is_empty(&self) -> bool { self.labels.is_empty() }

    fn compose_key(key: &str, group: &str, mode: Mode) -> SampleId {
        SampleId::new(format!("{group}/{key}{}", mode.label_key_suffix()))
    }

    /// Parse one table and insert its rows. Returns the row count.
    fn merge_csv<R: Read>(&mut self, reader: R, mode: Mode, path: &Path) -> Result<usize> {
        let err = |line: u64, reason: String| PipelineError::LabelTable {
            path: path.to_path_buf(),
            line: line as usize,
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = 0;
        for record in reader.records() {
            let record = record.map_err(|e| {
                err(e.position().map_or(0, |p| p.line()), e.to_string())
            })?;
            let line = record.position().map_or(0, |p| p.line());

            if record.len() != 3 {
                return Err(err(line, format!("expected 3 columns, found {}", record.len())));
            }
            let (key, group, value): (&str, &str, &str) =
                record.deserialize(None).map_err(|e| err(line, e.to_string()))?;
            let label: Label = value.parse().map_err(|e| err(line, e))?;

            self.labels.insert(Self::compose_key(key, group, mode), label);
            rows += 1;
        }

        Ok(rows)
    }
}

impl LabelSource for LabelTable {
    fn resolve(&self, id: &SampleId) -> Option<Label> {
        self.labels.get(id).copied()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_key_composition_per_mode() {
        let rows = [("abc", "warblrb10k", Label::PRESENT)];
        let train = LabelTable::from_rows(rows, Mode::Train);
        let test  = LabelTable::from_rows(rows, Mode::Predict);

        assert_eq!(train.resolve(&SampleId::from("warblrb10k/abc.wav")), Some(Label::PRESENT));
        assert_eq!(train.resolve(&SampleId::from("warblrb10k/abc")), None);
        assert_eq!(test.resolve(&SampleId::from("warblrb10k/abc")), Some(Label::PRESENT));
    }

    #[test]
    fn test_load_skips_header_and_blank_lines() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "ff1010bird.csv", "itemid,datasetid,hasbird\r\n64486,ff1010bird,0\r\n\r\n2525,ff1010bird,1\r\n");

        let table = LabelTable::load(&[path], Mode::Eval).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(&SampleId::from("ff1010bird/64486.wav")), Some(Label::ABSENT));
        assert_eq!(table.resolve(&SampleId::from("ff1010bird/2525.wav")), Some(Label::PRESENT));
    }

    #[test]
    fn test_later_tables_override() {
        let tmp = tempfile::tempdir().unwrap();
        let a = write(tmp.path(), "a.csv", "h,h,h\nx,g,0\n");
        let b = write(tmp.path(), "b.csv", "h,h,h\nx,g,1\n");

        let table = LabelTable::load(&[a, b], Mode::Train).unwrap();
        assert_eq!(table.resolve(&SampleId::from("g/x.wav")), Some(Label::PRESENT));
    }

    #[test]
    fn test_malformed_value_reports_line() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "bad.csv", "h,h,h\nx,g,1\ny,g,maybe\n");

        match LabelTable::load(&[path], Mode::Train) {
            Err(PipelineError::LabelTable { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected LabelTable error, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_column_count() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "short.csv", "h,h,h\nx,1\n");
        assert!(matches!(
            LabelTable::load(&[path], Mode::Train),
            Err(PipelineError::LabelTable { line: 2, .. })
        ));
    }

    #[test]
    fn test_quoted_fields() {
        let tmp  = tempfile::tempdir().unwrap();
        let text = "\"itemid\",\"datasetid\",\"hasbird\"\n\
                    \"abc\",\"warblrb10k\",\"1\"\n\
                    def,warblrb10k,\"0\"\n\
                    \"g,h\", warblrb10k , 1 \n";
        let path = write(tmp.path(), "quoted.csv", text);

        let table = LabelTable::load(&[path], Mode::Train).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.resolve(&SampleId::from("warblrb10k/abc.wav")), Some(Label::PRESENT));
        assert_eq!(table.resolve(&SampleId::from("warblrb10k/def.wav")), Some(Label::ABSENT));
        assert_eq!(table.resolve(&SampleId::from("warblrb10k/g,h.wav")), Some(Label::PRESENT));
    }

    #[test]
    fn test_missing_file_is_label_table_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            LabelTable::load(&[tmp.path().join("absent.csv")], Mode::Eval),
            Err(PipelineError::LabelTable { line: 0, .. })
        ));
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "empty.csv", "itemid,datasetid,hasbird\n");
        assert!(LabelTable::load(&[path], Mode::Train).unwrap().is_empty());
    }
}
