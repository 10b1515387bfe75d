use serde::{Deserialize, Serialize};

use crate::errors::SplitError;
use crate::scaffold_split::ScaffoldSplitter;
use crate::splits::{SplitIndices, SplitRatios, Splitter};

/// Top-level scaffold split configuration.
///
/// Every field has a default, so partial JSON/TOML documents deserialize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaffoldSplitConfig {
    /// Split ratios; validated when a split runs.
    pub ratios: SplitRatios,
    /// RNG seed for the group shuffle. `None` draws a fresh seed per run.
    pub seed: Option<u64>,
    /// Whether tetrahedral tags distinguish scaffolds.
    pub include_chirality: bool,
}

impl Default for ScaffoldSplitConfig {
    fn default() -> Self {
        Self {
            ratios: SplitRatios::default(),
            seed: None,
            include_chirality: false,
        }
    }
}

impl ScaffoldSplitConfig {
    /// Scaffold splitter over `smiles` honouring this configuration.
    pub fn splitter<'a, S: AsRef<str>>(&self, smiles: &'a [S]) -> ScaffoldSplitter<'a, S> {
        ScaffoldSplitter::new(smiles).include_chirality(self.include_chirality)
    }

    /// Three-way split of `smiles`, one record per entry.
    pub fn split<S: AsRef<str>>(&self, smiles: &[S]) -> Result<SplitIndices, SplitError> {
        self.splitter(smiles)
            .train_valid_test_split(smiles.len(), self.ratios, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ScaffoldSplitConfig::default();
        assert_eq!(config.ratios, SplitRatios::new(0.8, 0.1, 0.1));
        assert_eq!(config.seed, None);
        assert!(!config.include_chirality);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: ScaffoldSplitConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.ratios, SplitRatios::default());

        let config: ScaffoldSplitConfig = serde_json::from_str(
            r#"{"ratios": {"train": 0.5, "validation": 0.5, "test": 0.0}, "include_chirality": true}"#,
        )
        .unwrap();
        assert_eq!(config.ratios.validation, 0.5);
        assert!(config.include_chirality);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let config = ScaffoldSplitConfig {
            ratios: SplitRatios::new(0.7, 0.2, 0.1),
            seed: Some(99),
            include_chirality: true,
        };
        let text = serde_json::to_string(&config).unwrap();
        let back: ScaffoldSplitConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn split_uses_configured_seed_and_ratios() {
        let smiles = ["c1ccccc1O", "C1CCCCC1C", "Cc1ccccc1", "c1ccncc1C", "c1ccncc1O", "n1ccccc1"];
        let config = ScaffoldSplitConfig {
            ratios: SplitRatios::new(0.34, 0.33, 0.33),
            seed: Some(42),
            include_chirality: false,
        };
        let split = config.split(&smiles).unwrap();
        assert_eq!(split.train, vec![0, 2, 3, 4, 5]);
        assert_eq!(split.validation, vec![1]);
        assert!(split.test.is_empty());

        let bad = ScaffoldSplitConfig {
            ratios: SplitRatios::new(0.5, 0.5, 0.5),
            ..ScaffoldSplitConfig::default()
        };
        assert!(matches!(bad.split(&smiles), Err(SplitError::InvalidArgument(_))));
    }
}
