use std::collections::HashSet;

use serde::Serialize;

use crate::constants::splits::ALL_SPLITS;
use crate::splits::{BucketTargets, SplitIndices, SplitLabel, SplitRatios};
use crate::types::RecordIndex;

/// Realized versus requested size of each split.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SplitBalance {
    /// Records across all splits.
    pub total: usize,
    /// One entry per split, in train/validation/test order.
    pub per_split: Vec<SplitShare>,
}

impl SplitBalance {
    /// Entry for `label`.
    pub fn get(&self, label: SplitLabel) -> Option<&SplitShare> {
        self.per_split.iter().find(|share| share.label == label)
    }
}

/// Size of one split relative to its requested fraction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SplitShare {
    /// Which split this row describes.
    pub label: SplitLabel,
    /// Records assigned to the split.
    pub count: usize,
    /// `count` over all assigned records; 0 when nothing was assigned.
    pub realized: f64,
    /// Fraction asked for in the ratios.
    pub requested: f64,
    /// Floor target; `None` for the uncapped train split.
    pub target: Option<usize>,
    /// Records missing from the target. Always 0 for train.
    pub shortfall: usize,
}

/// Compare the split's sizes with what `ratios` asked for.
pub fn split_balance(split: &SplitIndices, ratios: SplitRatios) -> SplitBalance {
    let total = split.len();
    let targets = BucketTargets::from_ratios(total, ratios);
    let per_split = ALL_SPLITS
        .into_iter()
        .map(|label| {
            let count = split.get(label).len();
            let target = targets.capacity(label);
            SplitShare {
                label,
                count,
                realized: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64
                },
                requested: ratios.get(label),
                target,
                shortfall: target.map_or(0, |target| target.saturating_sub(count)),
            }
        })
        .collect();
    SplitBalance { total, per_split }
}

/// Number of groups whose members landed in more than one split.
///
/// Members missing from every split count as their own bucket.
pub fn straddling_groups<I, G>(groups: I, split: &SplitIndices) -> usize
where
    I: IntoIterator<Item = G>,
    G: AsRef<[RecordIndex]>,
{
    groups
        .into_iter()
        .filter(|group| {
            let labels: HashSet<Option<SplitLabel>> = group
                .as_ref()
                .iter()
                .map(|&index| split.label_of(index))
                .collect();
            labels.len() > 1
        })
        .count()
}
