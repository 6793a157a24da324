//! A knapsack solution: a fixed-length bitmask of included items, stored as
//! a `Vec<u64>` of words since multidimensional knapsack instances
//! routinely exceed 64 items.

use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    len: usize,
    words: Vec<u64>,
}

const WORD_BITS: usize = u64::BITS as usize;

impl Solution {
    pub fn empty(len: usize) -> Self {
        Self {
            len,
            words: vec![0u64; len.div_ceil(WORD_BITS)],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_included(&self, item: usize) -> bool {
        debug_assert!(item < self.len);
        (self.words[item / WORD_BITS] >> (item % WORD_BITS)) & 1 == 1
    }

    pub fn include(&mut self, item: usize) {
        debug_assert!(item < self.len);
        self.words[item / WORD_BITS] |= 1 << (item % WORD_BITS);
    }

    pub fn exclude(&mut self, item: usize) {
        debug_assert!(item < self.len);
        self.words[item / WORD_BITS] &= !(1 << (item % WORD_BITS));
    }

    pub fn included(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.is_included(i))
    }

    pub fn excluded(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| !self.is_included(i))
    }

    pub fn count_included(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Draw `q ~ U(0,1)` once, then flip each bit independently with
    /// probability `q`.
    pub fn random_bernoulli(len: usize, rng: &mut impl Rng) -> Self {
        let q: f64 = rng.random();
        let mut solution = Self::empty(len);
        for i in 0..len {
            if rng.random_bool(q) {
                solution.include(i);
            }
        }
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn include_exclude_roundtrip() {
        let mut sol = Solution::empty(70);
        assert!(!sol.is_included(65));
        sol.include(65);
        assert!(sol.is_included(65));
        assert_eq!(sol.count_included(), 1);
        sol.exclude(65);
        assert!(!sol.is_included(65));
        assert_eq!(sol.count_included(), 0);
    }

    #[test]
    fn included_and_excluded_partition_the_range() {
        let mut sol = Solution::empty(10);
        for i in [1, 3, 5, 7] {
            sol.include(i);
        }
        let included: Vec<_> = sol.included().collect();
        let excluded: Vec<_> = sol.excluded().collect();
        assert_eq!(included, vec![1, 3, 5, 7]);
        assert_eq!(excluded, vec![0, 2, 4, 6, 8, 9]);
        assert_eq!(included.len() + excluded.len(), 10);
    }

    #[test]
    fn random_bernoulli_is_within_bounds() {
        let mut rng = SmallRng::seed_from_u64(42);
        let sol = Solution::random_bernoulli(128, &mut rng);
        assert_eq!(sol.len(), 128);
        assert!(sol.count_included() <= 128);
    }
}
