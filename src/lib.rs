#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Serializable split configuration.
pub mod config;
/// Centralized constants for splits, RNG, and SMILES handling.
pub mod constants;
/// Reusable demo runners shared by downstream crates.
pub mod example_apps;
/// Split balance and group-integrity reporting.
pub mod metrics;
/// Seeded permutation helpers.
pub mod rng;
/// Murcko scaffold extraction and the key-extractor seam.
pub mod scaffold;
/// Scaffold-grouped greedy splitting.
pub mod scaffold_split;
/// SMILES parsing, perception, and canonical writing.
pub mod smiles;
/// Split labels, ratios, index sets, and the splitter trait.
pub mod splits;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::ScaffoldSplitConfig;
pub use errors::{SmilesError, SplitError};
pub use metrics::{SplitBalance, SplitShare, split_balance, straddling_groups};
pub use scaffold::{MurckoScaffold, ScaffoldKeyExtractor, generate_scaffold};
pub use scaffold_split::{
    ScaffoldSplitter, assign_groups, group_by_scaffold, scaffold_split, scaffold_train_valid_split,
};
pub use splits::{RandomSplitter, SplitDataset, SplitIndices, SplitLabel, SplitRatios, Splitter};
pub use types::{RecordIndex, ScaffoldGroup, ScaffoldKey, SmilesStr};
