//! Top-K selection over ranking scores
//!
//! A bounded min-heap keeps the best K candidates seen so far: O(N log K)
//! instead of sorting every candidate of a dataset.
//!
//! Ordering is total and deterministic: higher score first, equal scores
//! broken by lower encounter index, `NaN` ranks below every number.

use crate::{Error, Result};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
struct Scored {
    score: f64,
    index: usize,
}

impl Scored {
    fn key(self) -> f64 {
        if self.score.is_nan() {
            f64::NEG_INFINITY
        } else {
            self.score
        }
    }

    /// `Greater` when `self` ranks ahead of `other`.
    fn rank_cmp(self, other: Self) -> Ordering {
        self.key()
            .total_cmp(&other.key())
            .then_with(|| other.index.cmp(&self.index))
    }
}

// Heap item with reversed ordering: the worst kept candidate sits on top
#[derive(Debug)]
struct MinHeapItem(Scored);

impl PartialEq for MinHeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MinHeapItem {}

impl Ord for MinHeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.rank_cmp(self.0)
    }
}

impl PartialOrd for MinHeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Indices of the `k` best scores, best first.
///
/// Equivalent to a stable descending sort truncated to `k`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `k` is zero.
///
/// # Examples
///
/// ```rust
/// use evaltrack::rank::select_top_k;
///
/// let scores = [0.5, 0.9, 0.7, 0.9];
/// assert_eq!(select_top_k(&scores, 3).unwrap(), vec![1, 3, 2]);
/// ```
pub fn select_top_k(scores: &[f64], k: usize) -> Result<Vec<usize>> {
    if k == 0 {
        return Err(Error::InvalidInput("k must be greater than 0".to_string()));
    }

    let mut heap: BinaryHeap<MinHeapItem> = BinaryHeap::with_capacity(k.min(scores.len()));
    for (index, &score) in scores.iter().enumerate() {
        let item = Scored { score, index };
        if heap.len() < k {
            heap.push(MinHeapItem(item));
        } else if let Some(top) = heap.peek() {
            if item.rank_cmp(top.0) == Ordering::Greater {
                heap.pop();
                heap.push(MinHeapItem(item));
            }
        }
    }

    let mut kept: Vec<Scored> = heap.into_vec().into_iter().map(|item| item.0).collect();
    kept.sort_by(|a, b| b.rank_cmp(*a));
    Ok(kept.into_iter().map(|item| item.index).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_basic() {
        let scores = [0.1, 0.8, 0.3, 0.6];
        assert_eq!(select_top_k(&scores, 2).unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_top_k_ties_keep_encounter_order() {
        let scores = [0.5, 0.5, 0.5, 0.5];
        assert_eq!(select_top_k(&scores, 2).unwrap(), vec![0, 1]);
        assert_eq!(select_top_k(&scores, 4).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_top_k_larger_than_input() {
        let scores = [0.2, 0.4];
        assert_eq!(select_top_k(&scores, 10).unwrap(), vec![1, 0]);
        assert!(select_top_k(&[], 3).unwrap().is_empty());
    }

    #[test]
    fn test_top_k_zero() {
        assert!(select_top_k(&[1.0], 0).is_err());
    }

    #[test]
    fn test_nan_ranks_last() {
        let scores = [f64::NAN, 0.0, 0.3];
        assert_eq!(select_top_k(&scores, 3).unwrap(), vec![2, 1, 0]);
    }
}
