//! Batch splitting and schedule estimation.

use std::time::Duration;

/// Contiguous, ordered slice of pending work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a, T> {
    /// 0-based batch number.
    pub index: usize,
    /// Offset of the first item in the full list.
    pub start: usize,
    pub requests: &'a [T],
}

impl<'a, T> Batch<'a, T> {
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Partition `requests` into batches of at most `batch_size` items, in order.
///
/// A zero batch size is treated as 1.
pub fn split<T>(requests: &[T], batch_size: usize) -> Vec<Batch<'_, T>> {
    let size = batch_size.max(1);
    requests
        .chunks(size)
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            start: index * size,
            requests: chunk,
        })
        .collect()
}

/// `ceil(total / batch_size)`.
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    total.div_ceil(batch_size.max(1))
}

/// Rough wall-clock for a run: per-item pacing plus the pauses between batches.
pub fn estimate_completion(
    total: usize,
    batch_size: usize,
    per_item_delay: Duration,
    inter_batch_pause: Duration,
) -> Duration {
    if total == 0 {
        return Duration::ZERO;
    }
    let pauses = batch_count(total, batch_size).saturating_sub(1);
    per_item_delay
        .saturating_mul(total as u32)
        .saturating_add(inter_batch_pause.saturating_mul(pauses as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes_and_order() {
        let items: Vec<u32> = (0..23).collect();
        let batches = split(&items, 10);
        let sizes: Vec<_> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![10, 10, 3]);
        assert_eq!(batches[2].start, 20);
        assert_eq!(batches[2].index, 2);

        let flattened: Vec<u32> = batches.iter().flat_map(|b| b.requests.iter().copied()).collect();
        assert_eq!(flattened, items);
    }

    #[test]
    fn test_split_edge_cases() {
        let empty: Vec<u8> = Vec::new();
        assert!(split(&empty, 10).is_empty());

        let items = [1, 2, 3];
        assert_eq!(split(&items, 0).len(), 3);
        assert_eq!(split(&items, 100).len(), 1);
    }

    #[test]
    fn test_batch_count() {
        assert_eq!(batch_count(0, 10), 0);
        assert_eq!(batch_count(1, 10), 1);
        assert_eq!(batch_count(10, 10), 1);
        assert_eq!(batch_count(11, 10), 2);
        assert_eq!(batch_count(23, 10), 3);
        assert_eq!(batch_count(5, 0), 5);
        for n in 0..50 {
            for b in 1..12 {
                assert_eq!(batch_count(n, b), split(&vec![(); n], b).len());
            }
        }
    }

    #[test]
    fn test_estimate_completion() {
        let est = estimate_completion(23, 10, Duration::from_secs(1), Duration::from_secs(15));
        assert_eq!(est, Duration::from_secs(53));
        assert_eq!(
            estimate_completion(0, 10, Duration::from_secs(1), Duration::from_secs(15)),
            Duration::ZERO
        );
        // One batch, no pause.
        assert_eq!(
            estimate_completion(7, 10, Duration::from_secs(1), Duration::from_secs(15)),
            Duration::from_secs(7)
        );
    }
}
