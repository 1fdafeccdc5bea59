//! Injected source of randomness.
//!
//! Every random decision in the world (spawn placement, candidate ordering and
//! turn ordering) goes through [`RandomSource`], so a run is reproducible from
//! the state of the source alone.

use rand::seq::SliceRandom;
use rand::Rng;

/// Uniform integer and shuffle primitive
pub trait RandomSource {
    /// Uniform index in `0..upper`. `upper` must be non-zero.
    fn below(&mut self, upper: usize) -> usize;

    /// Shuffle `items` in place
    fn shuffle<T>(&mut self, items: &mut [T]);
}

impl<R: Rng> RandomSource for R {
    fn below(&mut self, upper: usize) -> usize {
        self.gen_range(0..upper)
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        SliceRandom::shuffle(items, self);
    }
}

/// Deterministic source that never reorders and always picks index zero.
///
/// Turn order then equals roster order and candidate scans follow the grid's
/// fixed neighbor order, which makes hand-built scenarios exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sequential;

impl RandomSource for Sequential {
    fn below(&mut self, upper: usize) -> usize {
        assert!(upper > 0, "below() called with an empty range");
        0
    }

    fn shuffle<T>(&mut self, _items: &mut [T]) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_seeded_source_is_reproducible() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);

        let mut left: Vec<u32> = (0..16).collect();
        let mut right = left.clone();
        a.shuffle(&mut left);
        b.shuffle(&mut right);

        assert_eq!(left, right);
        assert_eq!(a.below(1000), b.below(1000));
    }

    #[test]
    fn test_below_stays_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for upper in 1..50 {
            assert!(rng.below(upper) < upper);
        }
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut items: Vec<u32> = (0..32).collect();
        RandomSource::shuffle(&mut rng, &mut items);
        items.sort_unstable();
        assert_eq!(items, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn test_sequential_is_identity() {
        let mut source = Sequential;
        let mut items = vec![3, 1, 2];
        source.shuffle(&mut items);
        assert_eq!(items, vec![3, 1, 2]);
        assert_eq!(source.below(9), 0);
    }
}
