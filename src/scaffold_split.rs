//! Scaffold-grouped splitting.
//!
//! Records are grouped by scaffold key, the groups are shuffled with a seeded
//! generator, and each group in turn goes whole into validation if it still
//! fits, else test if it fits, else train. There is no backtracking, so
//! validation and test can come in under their targets when large groups
//! arrive early.

use indexmap::IndexMap;
use tracing::debug;

use crate::constants::splits::BUCKET_PRIORITY;
use crate::errors::SplitError;
use crate::rng::permutation;
use crate::scaffold::{MurckoScaffold, ScaffoldKeyExtractor};
use crate::splits::{BucketTargets, SplitIndices, SplitLabel, SplitRatios, Splitter};
use crate::types::{RecordIndex, ScaffoldGroup, ScaffoldKey};

/// Group record indices by scaffold key.
///
/// Keys appear in first-seen order and indices stay ascending within each
/// group. The first record whose structure cannot be read aborts the call.
pub fn group_by_scaffold<S, E>(
    smiles: &[S],
    extractor: &E,
    include_chirality: bool,
) -> Result<IndexMap<ScaffoldKey, ScaffoldGroup>, SplitError>
where
    S: AsRef<str>,
    E: ScaffoldKeyExtractor + ?Sized,
{
    let mut groups: IndexMap<ScaffoldKey, ScaffoldGroup> = IndexMap::new();
    for (index, encoding) in smiles.iter().enumerate() {
        let encoding = encoding.as_ref();
        let key = extractor
            .scaffold_key(encoding, include_chirality)
            .map_err(|source| {
                debug!(
                    "[molsplit:scaffold] record {} ('{}') has no usable structure: {}",
                    index, encoding, source
                );
                SplitError::StructureParse {
                    index,
                    smiles: encoding.to_string(),
                    source,
                }
            })?;
        groups.entry(key).or_default().push(index);
    }
    Ok(groups)
}

/// Shuffle `groups` and assign each one whole, first fit in
/// validation → test → train order.
///
/// `ratios` are assumed validated. Indices keep their group-contiguous order;
/// they are not re-sorted.
pub fn assign_groups(
    groups: Vec<ScaffoldGroup>,
    num_records: usize,
    ratios: SplitRatios,
    seed: Option<u64>,
) -> SplitIndices {
    let targets = BucketTargets::from_ratios(num_records, ratios);
    debug!(
        "[molsplit:scaffold] assigning {} scaffold groups over {} records (validation_target={}, test_target={})",
        groups.len(),
        num_records,
        targets.validation,
        targets.test
    );

    let mut split = SplitIndices::default();
    for group in permutation(groups, seed) {
        let label = BUCKET_PRIORITY
            .into_iter()
            .find(|&label| {
                targets
                    .capacity(label)
                    .is_none_or(|cap| split.get(label).len() + group.len() <= cap)
            })
            .unwrap_or(SplitLabel::Train);
        split.get_mut(label).extend(group);
    }

    debug!(
        "[molsplit:scaffold] split complete (train={}, validation={}, test={})",
        split.train.len(),
        split.validation.len(),
        split.test.len()
    );
    split
}

/// Group-aware splitter over a borrowed list of SMILES strings.
///
/// ```
/// use molsplit::{ScaffoldSplitter, SplitRatios, Splitter};
///
/// let smiles = ["c1ccccc1O", "C1CCCCC1N", "Cc1ccccc1", "CCO"];
/// let split = ScaffoldSplitter::new(&smiles)
///     .train_valid_test_split(smiles.len(), SplitRatios::new(0.5, 0.25, 0.25), Some(3))
///     .unwrap();
/// assert_eq!(split.len(), 4);
/// // both benzene derivatives share a split
/// assert_eq!(split.label_of(0), split.label_of(2));
/// ```
#[derive(Clone, Debug)]
pub struct ScaffoldSplitter<'a, S, E = MurckoScaffold> {
    smiles: &'a [S],
    include_chirality: bool,
    extractor: E,
}

impl<'a, S: AsRef<str>> ScaffoldSplitter<'a, S> {
    /// Splitter using the built-in Murcko extractor, chirality ignored.
    pub fn new(smiles: &'a [S]) -> Self {
        Self {
            smiles,
            include_chirality: false,
            extractor: MurckoScaffold,
        }
    }
}

impl<'a, S: AsRef<str>, E: ScaffoldKeyExtractor> ScaffoldSplitter<'a, S, E> {
    /// Let tetrahedral tags distinguish scaffolds.
    pub fn include_chirality(mut self, include_chirality: bool) -> Self {
        self.include_chirality = include_chirality;
        self
    }

    /// Swap the key extractor.
    pub fn with_extractor<F: ScaffoldKeyExtractor>(
        self,
        extractor: F,
    ) -> ScaffoldSplitter<'a, S, F> {
        ScaffoldSplitter {
            smiles: self.smiles,
            include_chirality: self.include_chirality,
            extractor,
        }
    }

    /// Scaffold groups for the wrapped records.
    pub fn scaffold_groups(&self) -> Result<IndexMap<ScaffoldKey, ScaffoldGroup>, SplitError> {
        group_by_scaffold(self.smiles, &self.extractor, self.include_chirality)
    }
}

impl<S: AsRef<str>, E: ScaffoldKeyExtractor> Splitter for ScaffoldSplitter<'_, S, E> {
    fn split_indices(
        &self,
        num_records: usize,
        ratios: SplitRatios,
        seed: Option<u64>,
    ) -> Result<SplitIndices, SplitError> {
        if self.smiles.len() != num_records {
            return Err(SplitError::LengthMismatch {
                records: num_records,
                encodings: self.smiles.len(),
            });
        }
        let groups = self.scaffold_groups()?;
        Ok(assign_groups(
            groups.into_values().collect(),
            num_records,
            ratios,
            seed,
        ))
    }
}

/// Three-way scaffold split with the built-in extractor.
pub fn scaffold_split<S: AsRef<str>>(
    num_records: usize,
    smiles: &[S],
    frac_train: f64,
    frac_valid: f64,
    frac_test: f64,
    seed: Option<u64>,
    include_chirality: bool,
) -> Result<SplitIndices, SplitError> {
    ScaffoldSplitter::new(smiles)
        .include_chirality(include_chirality)
        .train_valid_test_split(
            num_records,
            SplitRatios::new(frac_train, frac_valid, frac_test),
            seed,
        )
}

/// Two-way scaffold split; returns `(train, validation)`.
pub fn scaffold_train_valid_split<S: AsRef<str>>(
    num_records: usize,
    smiles: &[S],
    frac_train: f64,
    frac_valid: f64,
    seed: Option<u64>,
    include_chirality: bool,
) -> Result<(Vec<RecordIndex>, Vec<RecordIndex>), SplitError> {
    ScaffoldSplitter::new(smiles)
        .include_chirality(include_chirality)
        .train_valid_split(num_records, frac_train, frac_valid, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SmilesError;

    #[test]
    fn groups_follow_first_seen_key_order() {
        let smiles = ["c1ccccc1O", "C1CCCCC1C", "Cc1ccccc1", "CCO", "OCC"];
        let groups = group_by_scaffold(&smiles, &MurckoScaffold, false).unwrap();
        let collected: Vec<(&str, Vec<usize>)> = groups
            .iter()
            .map(|(key, members)| (key.as_str(), members.clone()))
            .collect();
        assert_eq!(
            collected,
            vec![
                ("c1ccccc1", vec![0, 2]),
                ("C1CCCCC1", vec![1]),
                ("", vec![3, 4]),
            ]
        );
    }

    #[test]
    fn first_unreadable_record_aborts_grouping() {
        let smiles = ["c1ccccc1", "C1CC", "C(("];
        let err = group_by_scaffold(&smiles, &MurckoScaffold, false).unwrap_err();
        assert!(matches!(
            err,
            SplitError::StructureParse {
                index: 1,
                ref smiles,
                source: SmilesError::UnclosedRing { digit: 1 },
            } if smiles == "C1CC"
        ));
        assert!(!err.is_configuration());
    }

    #[test]
    fn greedy_pass_matches_pinned_order() {
        let groups = vec![vec![0, 2], vec![1], vec![3, 4, 5]];
        let split = assign_groups(groups, 6, SplitRatios::new(0.34, 0.33, 0.33), Some(42));
        assert_eq!(split.train, vec![0, 2, 3, 4, 5]);
        assert_eq!(split.validation, vec![1]);
        assert!(split.test.is_empty());
    }

    #[test]
    fn greedy_pass_fills_validation_then_test() {
        let groups = || vec![vec![0, 1, 2], vec![3], vec![4, 5], vec![6], vec![7, 8, 9]];
        let ratios = SplitRatios::new(0.6, 0.2, 0.2);

        let split = assign_groups(groups(), 10, ratios, Some(7));
        assert_eq!(split.train, vec![7, 8, 9, 0, 1, 2]);
        assert_eq!(split.validation, vec![6, 3]);
        assert_eq!(split.test, vec![4, 5]);

        let split = assign_groups(groups(), 10, ratios, Some(3));
        assert_eq!(split.train, vec![7, 8, 9, 0, 1, 2]);
        assert_eq!(split.validation, vec![4, 5]);
        assert_eq!(split.test, vec![6, 3]);
    }

    #[test]
    fn all_train_ratios_keep_everything_in_train() {
        let groups = vec![vec![0], vec![1, 2], vec![3]];
        let split = assign_groups(groups, 4, SplitRatios::new(1.0, 0.0, 0.0), Some(5));
        assert_eq!(split.train.len(), 4);
        assert!(split.validation.is_empty());
        assert!(split.test.is_empty());
    }

    #[test]
    fn length_mismatch_is_checked_after_ratios() {
        let smiles = ["c1ccccc1", "CCO"];
        let err = scaffold_split(3, &smiles, 0.8, 0.1, 0.1, Some(1), false).unwrap_err();
        assert!(matches!(
            err,
            SplitError::LengthMismatch {
                records: 3,
                encodings: 2
            }
        ));

        let err = scaffold_split(3, &smiles, 0.8, 0.1, 0.05, Some(1), false).unwrap_err();
        assert!(matches!(err, SplitError::InvalidArgument(_)));
    }

    #[test]
    fn custom_extractor_drives_grouping() {
        let smiles = ["a", "bb", "cc", "d"];
        let by_length = |smiles: &str, _: bool| -> Result<ScaffoldKey, SmilesError> {
            Ok(smiles.len().to_string())
        };
        let splitter = ScaffoldSplitter::new(&smiles).with_extractor(by_length);
        let groups = splitter.scaffold_groups().unwrap();
        assert_eq!(groups.get("1"), Some(&vec![0, 3]));
        assert_eq!(groups.get("2"), Some(&vec![1, 2]));

        let split = splitter
            .train_valid_test_split(4, SplitRatios::new(0.5, 0.5, 0.0), Some(11))
            .unwrap();
        assert_eq!(split.label_of(0), split.label_of(3));
        assert_eq!(split.label_of(1), split.label_of(2));
    }

    #[test]
    fn empty_dataset_splits_to_nothing() {
        let smiles: [&str; 0] = [];
        let split = scaffold_split(0, &smiles, 0.8, 0.1, 0.1, Some(1), false).unwrap();
        assert!(split.is_empty());
    }
}
