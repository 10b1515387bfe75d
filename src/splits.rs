use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::splits::{
    ALL_SPLITS, DEFAULT_TRAIN_VALID, DEFAULT_TRAIN_VALID_TEST, FRACTION_SUM_TOLERANCE,
};
use crate::errors::SplitError;
use crate::rng::permutation;
use crate::types::RecordIndex;

/// Logical dataset partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitLabel {
    /// Training split.
    Train,
    /// Validation split.
    Validation,
    /// Test split.
    Test,
}

impl SplitLabel {
    /// Lowercase name used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            SplitLabel::Train => "train",
            SplitLabel::Validation => "validation",
            SplitLabel::Test => "test",
        }
    }
}

/// Ratio configuration for train/validation/test assignment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    /// Fraction assigned to train.
    pub train: f64,
    /// Fraction assigned to validation.
    pub validation: f64,
    /// Fraction assigned to test.
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        let (train, validation, test) = DEFAULT_TRAIN_VALID_TEST;
        Self {
            train,
            validation,
            test,
        }
    }
}

impl SplitRatios {
    /// Three-way ratios.
    pub fn new(train: f64, validation: f64, test: f64) -> Self {
        Self {
            train,
            validation,
            test,
        }
    }

    /// Two-way ratios with no test bucket.
    pub fn train_valid(train: f64, validation: f64) -> Self {
        Self::new(train, validation, 0.0)
    }

    /// Default two-way ratios (0.9 / 0.1).
    pub fn default_train_valid() -> Self {
        let (train, validation) = DEFAULT_TRAIN_VALID;
        Self::train_valid(train, validation)
    }

    /// Fraction requested for `label`.
    pub fn get(self, label: SplitLabel) -> f64 {
        match label {
            SplitLabel::Train => self.train,
            SplitLabel::Validation => self.validation,
            SplitLabel::Test => self.test,
        }
    }

    /// Validate that each ratio lies in `[0, 1]` and that they sum to `1.0` (within epsilon).
    pub fn normalized(self) -> Result<Self, SplitError> {
        for label in ALL_SPLITS {
            let value = self.get(label);
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SplitError::InvalidArgument(format!(
                    "{} fraction must lie in [0, 1], got {value}",
                    label.as_str()
                )));
            }
        }
        let sum = self.train + self.validation + self.test;
        if (sum - 1.0).abs() > FRACTION_SUM_TOLERANCE {
            return Err(SplitError::InvalidArgument(format!(
                "split ratios must sum to 1.0 (got {sum})"
            )));
        }
        Ok(self)
    }
}

/// Record-count targets for the capped buckets. Train is uncapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketTargets {
    /// `floor(validation * N)`.
    pub validation: usize,
    /// `floor(test * N)`.
    pub test: usize,
}

impl BucketTargets {
    /// Targets for `num_records` records under `ratios`.
    pub fn from_ratios(num_records: usize, ratios: SplitRatios) -> Self {
        let n = num_records as f64;
        Self {
            validation: (ratios.validation * n).floor() as usize,
            test: (ratios.test * n).floor() as usize,
        }
    }

    /// Maximum records `label` may hold, or `None` when uncapped.
    pub fn capacity(&self, label: SplitLabel) -> Option<usize> {
        match label {
            SplitLabel::Train => None,
            SplitLabel::Validation => Some(self.validation),
            SplitLabel::Test => Some(self.test),
        }
    }
}

/// Record indices assigned to each split.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIndices {
    /// Training indices.
    pub train: Vec<RecordIndex>,
    /// Validation indices.
    pub validation: Vec<RecordIndex>,
    /// Test indices.
    pub test: Vec<RecordIndex>,
}

impl SplitIndices {
    /// Indices assigned to `label`.
    pub fn get(&self, label: SplitLabel) -> &[RecordIndex] {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.validation,
            SplitLabel::Test => &self.test,
        }
    }

    pub(crate) fn get_mut(&mut self, label: SplitLabel) -> &mut Vec<RecordIndex> {
        match label {
            SplitLabel::Train => &mut self.train,
            SplitLabel::Validation => &mut self.validation,
            SplitLabel::Test => &mut self.test,
        }
    }

    /// Total number of assigned indices.
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    /// True when nothing was assigned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split holding `index`, if any.
    pub fn label_of(&self, index: RecordIndex) -> Option<SplitLabel> {
        ALL_SPLITS
            .into_iter()
            .find(|&label| self.get(label).contains(&index))
    }

    /// Per-record labels for `0..num_records`.
    ///
    /// Fails with [`SplitError::InconsistentAssignment`] unless the three sets
    /// form an exact partition of `0..num_records`.
    pub fn assignments(&self, num_records: usize) -> Result<Vec<SplitLabel>, SplitError> {
        let mut labels: Vec<Option<SplitLabel>> = vec![None; num_records];
        for label in ALL_SPLITS {
            for &index in self.get(label) {
                let slot = labels.get_mut(index).ok_or_else(|| {
                    SplitError::InconsistentAssignment(format!(
                        "index {index} is outside 0..{num_records}"
                    ))
                })?;
                if slot.replace(label).is_some() {
                    return Err(SplitError::InconsistentAssignment(format!(
                        "index {index} assigned more than once"
                    )));
                }
            }
        }
        labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| {
                label.ok_or_else(|| {
                    SplitError::InconsistentAssignment(format!("index {index} was never assigned"))
                })
            })
            .collect()
    }

    /// `(train, validation, test)`.
    pub fn into_parts(self) -> (Vec<RecordIndex>, Vec<RecordIndex>, Vec<RecordIndex>) {
        (self.train, self.validation, self.test)
    }

    /// Gather the records behind each index set, preserving index order.
    pub fn materialize<T: Clone>(&self, records: &[T]) -> Result<SplitDataset<T>, SplitError> {
        let gather = |indices: &[RecordIndex]| -> Result<Vec<T>, SplitError> {
            indices
                .iter()
                .map(|&index| {
                    records.get(index).cloned().ok_or_else(|| {
                        SplitError::InvalidArgument(format!(
                            "index {index} out of range for {} records",
                            records.len()
                        ))
                    })
                })
                .collect()
        };
        Ok(SplitDataset {
            train: gather(&self.train)?,
            validation: gather(&self.validation)?,
            test: gather(&self.test)?,
        })
    }
}

/// Records gathered per split by [`SplitIndices::materialize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitDataset<T> {
    /// Training records.
    pub train: Vec<T>,
    /// Validation records.
    pub validation: Vec<T>,
    /// Test records.
    pub test: Vec<T>,
}

/// Splitting capability shared by random and group-aware splitters.
///
/// Implementors provide [`Splitter::split_indices`] against already validated
/// ratios; the provided methods validate and adapt the result.
pub trait Splitter {
    /// Assign `0..num_records` to splits. `ratios` have been validated.
    fn split_indices(
        &self,
        num_records: usize,
        ratios: SplitRatios,
        seed: Option<u64>,
    ) -> Result<SplitIndices, SplitError>;

    /// Validate `ratios`, then split three ways.
    fn train_valid_test_split(
        &self,
        num_records: usize,
        ratios: SplitRatios,
        seed: Option<u64>,
    ) -> Result<SplitIndices, SplitError> {
        let ratios = ratios.normalized()?;
        self.split_indices(num_records, ratios, seed)
    }

    /// Two-way split: the three-way split with a zero test fraction.
    fn train_valid_split(
        &self,
        num_records: usize,
        frac_train: f64,
        frac_valid: f64,
        seed: Option<u64>,
    ) -> Result<(Vec<RecordIndex>, Vec<RecordIndex>), SplitError> {
        let ratios = SplitRatios::train_valid(frac_train, frac_valid);
        let split = self.train_valid_test_split(num_records, ratios, seed)?;
        if !split.test.is_empty() {
            return Err(SplitError::InconsistentAssignment(format!(
                "two-way split assigned {} records to test",
                split.test.len()
            )));
        }
        let (train, validation, _) = split.into_parts();
        Ok((train, validation))
    }
}

/// Record-level random split that ignores structure.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSplitter;

impl Splitter for RandomSplitter {
    fn split_indices(
        &self,
        num_records: usize,
        ratios: SplitRatios,
        seed: Option<u64>,
    ) -> Result<SplitIndices, SplitError> {
        let order = permutation((0..num_records).collect::<Vec<_>>(), seed);
        let targets = BucketTargets::from_ratios(num_records, ratios);
        let valid_end = targets.validation.min(num_records);
        let test_end = (valid_end + targets.test).min(num_records);

        let split = SplitIndices {
            validation: order[..valid_end].to_vec(),
            test: order[valid_end..test_end].to_vec(),
            train: order[test_end..].to_vec(),
        };
        debug!(
            "[molsplit:random] split {} records (train={}, validation={}, test={})",
            num_records,
            split.train.len(),
            split.validation.len(),
            split.test.len()
        );
        Ok(split)
    }
}
