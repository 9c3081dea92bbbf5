// ============================================================
// Layer 2 — Dataset Profiles
// ============================================================
// Named presets for the public bird-detection corpora and their
// unions. A profile says which id list each split reads, how
// many samples the split declares, and the class weights a
// classifier should use for it.
//
//   profile           val            test     train            sizes (v/t/tr)
//   birdvox           val_B          test_B   train_B          1000/3000/16000
//   warblr            val_W          test_W   train_W          400/1200/6400
//   freefield         val_F          test_F   train_F          385/1153/6152
//   warblr-freefield  val_WF         test_WF  train_WF         785/2353/12552
//   all               val_BWF_short  test     train_BWF_short  1000/12620/16000
//   smoke             val_test       test_test train_test      20/20/45
//
// Steps per epoch:
//   train = floor(size · A / N)
//   eval  = floor(size / N)
//   test  = ceil(size / N)   (the last batch may wrap around)
//
// Reference: Rust Book §6 (Enums), §5 (Method Syntax)

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::domain::sample::Mode;

/// Class weights `{0: absent, 1: present}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    pub absent:  f64,
    pub present: f64,
}

/// One split of a profile: list file name and declared size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub list: &'static str,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetProfile {
    Birdvox,
    Warblr,
    Freefield,
    WarblrFreefield,
    All,
    Smoke,
}

impl DatasetProfile {
    pub const ALL: [DatasetProfile; 6] = [
        DatasetProfile::Birdvox,
        DatasetProfile::Warblr,
        DatasetProfile::Freefield,
        DatasetProfile::WarblrFreefield,
        DatasetProfile::All,
        DatasetProfile::Smoke,
    ];

    /// (val, test, train) splits
    fn splits(self) -> (Split, Split, Split) {
        let s = |list, size| Split { list, size };
        match self {
            DatasetProfile::Birdvox => {
                (s("val_B", 1000), s("test_B", 3000), s("train_B", 16000))
            }
            DatasetProfile::Warblr => {
                (s("val_W", 400), s("test_W", 1200), s("train_W", 6400))
            }
            DatasetProfile::Freefield => {
                (s("val_F", 385), s("test_F", 1153), s("train_F", 6152))
            }
            DatasetProfile::WarblrFreefield => {
                (s("val_WF", 785), s("test_WF", 2353), s("train_WF", 12552))
            }
            DatasetProfile::All => {
                (s("val_BWF_short", 1000), s("test", 12620), s("train_BWF_short", 16000))
            }
            DatasetProfile::Smoke => {
                (s("val_test", 20), s("test_test", 20), s("train_test", 45))
            }
        }
    }

    /// The split a stream in `mode` reads
    pub fn split(self, mode: Mode) -> Split {
        let (val, test, train) = self.splits();
        match mode {
            Mode::Train   => train,
            Mode::Eval    => val,
            Mode::Predict => test,
        }
    }

    pub fn class_weights(self) -> ClassWeights {
        let (absent, present) = match self {
            DatasetProfile::Warblr    => (0.75, 0.25),
            DatasetProfile::Freefield => (0.25, 0.75),
            _                         => (0.50, 0.50),
        };
        ClassWeights { absent, present }
    }

    /// Batches per epoch for `mode` with batch size `batch_size`
    /// and `augment` examples per training sample.
    pub fn steps(self, mode: Mode, batch_size: usize, augment: usize) -> usize {
        let size = self.split(mode).size;
        match mode {
            Mode::Train   => size * augment / batch_size,
            Mode::Eval    => size / batch_size,
            Mode::Predict => size.div_ceil(batch_size),
        }
    }
}

impl fmt::Display for DatasetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DatasetProfile::Birdvox         => "birdvox",
            DatasetProfile::Warblr          => "warblr",
            DatasetProfile::Freefield       => "freefield",
            DatasetProfile::WarblrFreefield => "warblr-freefield",
            DatasetProfile::All             => "all",
            DatasetProfile::Smoke           => "smoke",
        })
    }
}

impl FromStr for DatasetProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.to_string() == wanted)
            .ok_or_else(|| {
                let names: Vec<String> = Self::ALL.iter().map(|p| p.to_string()).collect();
                format!("unknown dataset profile '{s}' ({})", names.join(", "))
            })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_selection() {
        let p = DatasetProfile::Birdvox;
        assert_eq!(p.split(Mode::Train), Split { list: "train_B", size: 16000 });
        assert_eq!(p.split(Mode::Eval).list, "val_B");
        assert_eq!(p.split(Mode::Predict).list, "test_B");
    }

    #[test]
    fn test_steps_rounding() {
        let p = DatasetProfile::Freefield;
        // 6152 * 2 / 16 = 769
        assert_eq!(p.steps(Mode::Train, 16, 2), 769);
        // 385 / 16 = 24.06 → 24
        assert_eq!(p.steps(Mode::Eval, 16, 1), 24);
        // 1153 / 16 = 72.06 → 73
        assert_eq!(p.steps(Mode::Predict, 16, 1), 73);
    }

    #[test]
    fn test_smoke_profile_steps() {
        assert_eq!(DatasetProfile::Smoke.steps(Mode::Train, 16, 1), 2);
        assert_eq!(DatasetProfile::Smoke.steps(Mode::Predict, 16, 1), 2);
    }

    #[test]
    fn test_class_weights() {
        assert_eq!(DatasetProfile::Warblr.class_weights().absent, 0.75);
        assert_eq!(DatasetProfile::Freefield.class_weights().present, 0.75);
        assert_eq!(DatasetProfile::All.class_weights().present, 0.5);
    }

    #[test]
    fn test_from_str_round_trips_names() {
        for p in DatasetProfile::ALL {
            assert_eq!(p.to_string().parse::<DatasetProfile>().unwrap(), p);
        }
        assert!("birdvox2".parse::<DatasetProfile>().is_err());
    }
}
