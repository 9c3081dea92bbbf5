// ============================================================
// Layer 6 — Config Store
// ============================================================
// Saves and loads a PipelineConfig as pretty-printed JSON so a
// run can be reproduced exactly:
//
//   birdfeat config save run.json --format parametric
//   birdfeat stream --config run.json --mode train
//
// A loaded config is validated before it is handed back.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::application::config::PipelineConfig;

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, cfg: &PipelineConfig) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }

        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write config to '{}'", self.path.display()))?;

        tracing::debug!("Saved pipeline config to '{}'", self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<PipelineConfig> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read config from '{}'", self.path.display()))?;

        let cfg: PipelineConfig = serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a valid pipeline config", self.path.display()))?;
        cfg.validate()
            .with_context(|| format!("Config '{}' is invalid", self.path.display()))?;

        tracing::debug!("Loaded pipeline config from '{}'", self.path.display());
        Ok(cfg)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aligner::ShrinkFidelity;
    use crate::data::preprocessor::MinMaxBounds;

    #[test]
    fn test_save_then_load() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(tmp.path().join("cfg/run.json"));

        let cfg = PipelineConfig {
            batch_size:    8,
            fidelity:      ShrinkFidelity::Reference,
            normalization: Some(MinMaxBounds { min: -80.0, max: 0.5 }),
            ..Default::default()
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load().unwrap(), cfg);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, r#"{ "batch_size": 0 }"#).unwrap();
        assert!(ConfigStore::new(path).load().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(ConfigStore::new("/no/such/config.json").load().is_err());
    }
}
