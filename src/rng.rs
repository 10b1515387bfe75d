//! Seedable permutation source.
//!
//! Group and record orderings come from `SliceRandom::shuffle` driven by a
//! splitmix64 stream, so a seed pins the split for a given `rand` release.

use rand::rand_core::impls::fill_bytes_via_next;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use crate::constants::rng::{SPLITMIX_GAMMA, SPLITMIX_MUL_1, SPLITMIX_MUL_2};

/// Splitmix64 generator behind every seeded shuffle in the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Start the stream at `seed`.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Current internal state; feeding it back to [`DeterministicRng::new`] resumes the stream.
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl SeedableRng for DeterministicRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

impl RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        // low half of the 64-bit output
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX_GAMMA);
        let mixed = (self.state ^ (self.state >> 30)).wrapping_mul(SPLITMIX_MUL_1);
        let mixed = (mixed ^ (mixed >> 27)).wrapping_mul(SPLITMIX_MUL_2);
        mixed ^ (mixed >> 31)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        fill_bytes_via_next(self, dest)
    }
}

/// Return `seed`, or draw one from the thread RNG when unset.
///
/// A drawn seed is logged at debug level so an unseeded run can be replayed.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        let drawn = rand::random::<u64>();
        debug!("[molsplit:rng] no seed supplied; drew seed={}", drawn);
        drawn
    })
}

/// Return a uniformly random permutation of `items`.
///
/// With `Some(seed)` the result is reproducible; with `None` a seed is drawn
/// through [`resolve_seed`].
pub fn permutation<T>(mut items: Vec<T>, seed: Option<u64>) -> Vec<T> {
    let mut rng = DeterministicRng::seed_from_u64(resolve_seed(seed));
    items.shuffle(&mut rng);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitmix_stream_matches_reference_values() {
        let mut rng = DeterministicRng::new(0);
        assert_eq!(rng.next_u64(), 0xE220_A839_7B1D_CDAF);
        assert_eq!(rng.next_u64(), 0x6E78_9E6A_A1B9_65F4);
        assert_eq!(rng.next_u64(), 0x06C4_5D18_8009_454F);
    }

    #[test]
    fn state_round_trip_resumes_stream() {
        let mut rng_a = DeterministicRng::new(123);
        let _ = rng_a.next_u64();
        let saved = rng_a.state();
        let expected = rng_a.next_u64();

        let mut rng_b = DeterministicRng::new(saved);
        assert_eq!(rng_b.next_u64(), expected);
    }

    #[test]
    fn byte_seed_matches_integer_seed() {
        let from_bytes = DeterministicRng::from_seed(99u64.to_le_bytes());
        assert_eq!(from_bytes, DeterministicRng::seed_from_u64(99));
    }

    #[test]
    fn permutation_is_pinned_for_seed() {
        let order = permutation((0..10).collect::<Vec<usize>>(), Some(42));
        assert_eq!(order, vec![8, 6, 2, 1, 0, 4, 7, 9, 3, 5]);
    }

    #[test]
    fn permutation_is_reproducible_and_complete() {
        let items: Vec<usize> = (0..50).collect();
        let first = permutation(items.clone(), Some(42));
        let second = permutation(items.clone(), Some(42));
        assert_eq!(first, second);
        assert_ne!(first, items);

        let mut sorted = first.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, items);
    }

    #[test]
    fn permutation_handles_trivial_inputs() {
        let empty: Vec<u8> = permutation(Vec::new(), Some(1));
        assert!(empty.is_empty());
        assert_eq!(permutation(vec![9], Some(1)), vec![9]);
    }

    #[test]
    fn resolve_seed_keeps_explicit_seed() {
        assert_eq!(resolve_seed(Some(17)), 17);
        let drawn = resolve_seed(None);
        assert_eq!(
            permutation((0..20).collect::<Vec<usize>>(), Some(drawn)),
            permutation((0..20).collect::<Vec<usize>>(), Some(drawn))
        );
    }

    #[test]
    fn fill_bytes_uses_little_endian_words() {
        let mut reference = DeterministicRng::new(5);
        let word = reference.next_u64().to_le_bytes();

        let mut rng = DeterministicRng::new(5);
        let mut buf = [0u8; 5];
        rng.fill_bytes(&mut buf);
        assert_eq!(buf, word[..5]);
    }
}
