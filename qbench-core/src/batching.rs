//! Keyed batching and batch submission
//!
//! Splits an ordered list of circuits (each tagged with a key) into
//! size-bounded batches and submits them one job per batch. Keys always
//! travel with their circuits, so the i-th histogram of a job can be matched
//! with the i-th key of its batch.

use crate::backend::{Backend, RunOptions};
use crate::circuit::Circuit;
use crate::error::{QBenchError, Result};
use crate::jobs::JobHandle;
use crate::models::{BatchResult, CircuitKey};
use crate::progress;
use log::debug;
use std::num::NonZeroUsize;

/// Ordered batch of items with their keys, at the same positions
#[derive(Debug, Clone, PartialEq)]
pub struct BatchWithKeys<T, K> {
    pub items: Vec<T>,
    pub keys: Vec<K>,
}

impl<T, K> BatchWithKeys<T, K> {
    /// Number of items in the batch
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Submitted job together with the keys of its circuits
#[derive(Clone)]
pub struct BatchJob {
    pub job: JobHandle,
    pub keys: Vec<CircuitKey>,
}

impl BatchJob {
    /// Serializable `{job_id, keys}` record
    pub fn to_record(&self) -> BatchResult {
        BatchResult {
            job_id: self.job.job_id().to_string(),
            keys: self.keys.clone(),
        }
    }
}

impl std::fmt::Debug for BatchJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchJob")
            .field("job_id", &self.job.job_id())
            .field("keys", &self.keys)
            .finish()
    }
}

/// Split items and keys into batches of at most `batch_size`
///
/// With no size, a single batch holding everything is returned (even when
/// there are no items). With a size, `ceil(n / size)` batches are returned,
/// all full except possibly the last; no items means no batches.
pub fn batch_circuits_with_keys<T, K>(
    items: Vec<T>,
    keys: Vec<K>,
    batch_size: Option<NonZeroUsize>,
) -> Result<Vec<BatchWithKeys<T, K>>> {
    if items.len() != keys.len() {
        return Err(QBenchError::LengthMismatch {
            items: items.len(),
            keys: keys.len(),
        });
    }

    let Some(size) = batch_size.map(NonZeroUsize::get) else {
        return Ok(vec![BatchWithKeys { items, keys }]);
    };

    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut items = items.into_iter().peekable();
    let mut keys = keys.into_iter();
    while items.peek().is_some() {
        let batch_items: Vec<T> = items.by_ref().take(size).collect();
        let batch_keys: Vec<K> = keys.by_ref().take(batch_items.len()).collect();
        batches.push(BatchWithKeys {
            items: batch_items,
            keys: batch_keys,
        });
    }
    Ok(batches)
}

/// Submit circuits in batches, one job per batch, in order
///
/// Returns one [`BatchJob`] per batch. Whether the call waits for results is
/// up to the backend. With `show_progress`, a bar advances per submitted batch.
pub fn execute_in_batches(
    backend: &dyn Backend,
    circuits: Vec<Circuit>,
    keys: Vec<CircuitKey>,
    shots: u32,
    batch_size: Option<NonZeroUsize>,
    options: &RunOptions,
    show_progress: bool,
) -> Result<Vec<BatchJob>> {
    let batches = batch_circuits_with_keys(circuits, keys, batch_size)?;
    let n_batches = batches.len();
    let bar = progress::bar(n_batches, "Submitting", show_progress);

    let mut jobs = Vec::with_capacity(n_batches);
    for (i, batch) in batches.into_iter().enumerate() {
        let job = backend.run(&batch.items, shots, options)?;
        debug!(
            "Submitted batch {}/{} ({} circuits) as job {}",
            i + 1,
            n_batches,
            batch.len(),
            job.job_id()
        );
        jobs.push(BatchJob {
            job,
            keys: batch.keys,
        });
        bar.inc(1);
    }
    bar.finish_and_clear();
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sizes<T, K>(batches: &[BatchWithKeys<T, K>]) -> Vec<usize> {
        batches.iter().map(|b| b.len()).collect()
    }

    fn batch_n(n: usize, size: Option<usize>) -> Vec<BatchWithKeys<String, usize>> {
        let items = (0..n).map(|i| format!("circuit-{}", i)).collect();
        let keys = (0..n).collect();
        batch_circuits_with_keys(items, keys, size.and_then(NonZeroUsize::new)).unwrap()
    }

    #[test]
    fn test_five_items_in_pairs() {
        let batches = batch_n(5, Some(2));
        assert_eq!(sizes(&batches), vec![2, 2, 1]);
        assert_eq!(batches[2].keys, vec![4]);
        assert_eq!(batches[2].items, vec!["circuit-4".to_string()]);
    }

    #[test]
    fn test_concrete_partitions() {
        assert_eq!(sizes(&batch_n(10, Some(3))), vec![3, 3, 3, 1]);
        assert_eq!(sizes(&batch_n(8, Some(4))), vec![4, 4]);
        assert_eq!(sizes(&batch_n(10, None)), vec![10]);
    }

    #[test]
    fn test_no_items() {
        assert!(batch_n(0, Some(3)).is_empty());

        let unbounded = batch_n(0, None);
        assert_eq!(unbounded.len(), 1);
        assert!(unbounded[0].is_empty());
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let err = batch_circuits_with_keys(vec![1, 2, 3], vec!["a", "b"], None).unwrap_err();
        assert!(matches!(err, QBenchError::LengthMismatch { items: 3, keys: 2 }));
    }

    proptest! {
        #[test]
        fn prop_batch_count_and_sizes(n in 0usize..200, size in 1usize..50) {
            let batches = batch_n(n, Some(size));

            prop_assert_eq!(batches.len(), n.div_ceil(size));
            prop_assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), n);
            if let Some((last, full)) = batches.split_last() {
                prop_assert!(full.iter().all(|b| b.len() == size));
                prop_assert!(last.len() >= 1 && last.len() <= size);
            }
        }

        #[test]
        fn prop_unbounded_is_single_batch(n in 0usize..200) {
            let batches = batch_n(n, None);

            prop_assert_eq!(batches.len(), 1);
            prop_assert_eq!(&batches[0].keys, &(0..n).collect::<Vec<_>>());
        }

        #[test]
        fn prop_items_stay_with_keys(n in 0usize..200, size in proptest::option::of(1usize..50)) {
            let batches = batch_n(n, size);

            for batch in &batches {
                prop_assert_eq!(batch.items.len(), batch.keys.len());
                for (item, key) in batch.items.iter().zip(&batch.keys) {
                    prop_assert_eq!(item, &format!("circuit-{}", key));
                }
            }

            let keys: Vec<usize> = batches.into_iter().flat_map(|b| b.keys).collect();
            prop_assert_eq!(keys, (0..n).collect::<Vec<_>>());
        }
    }
}
