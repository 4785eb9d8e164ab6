use model::records::top::TopRow;
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    sync::{Mutex, PoisonError},
};

#[derive(Debug, Clone)]
struct Entry(TopRow);

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.0.row_size == other.0.row_size
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.row_size.cmp(&other.0.row_size)
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Keeps the `capacity` largest rows offered to it.
///
/// Once full, a new row evicts the current smallest only when strictly
/// larger, so among equal sizes the earliest offered rows stay.
#[derive(Debug)]
pub struct BoundedTopK {
    capacity: usize,
    heap: Mutex<BinaryHeap<Reverse<Entry>>>,
}

impl BoundedTopK {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: Mutex::new(BinaryHeap::new()),
        }
    }

    pub fn push(&self, hash_key: &[u8], sort_key: &[u8], row_size: u64) {
        if self.capacity == 0 {
            return;
        }
        let mut heap = self.heap.lock().unwrap_or_else(PoisonError::into_inner);
        if heap.len() < self.capacity {
            heap.push(Reverse(Entry(TopRow::new(
                hash_key.to_vec(),
                sort_key.to_vec(),
                row_size,
            ))));
            return;
        }
        let smallest = heap.peek().map(|Reverse(e)| e.0.row_size);
        if smallest.is_some_and(|min| row_size > min) {
            heap.pop();
            heap.push(Reverse(Entry(TopRow::new(
                hash_key.to_vec(),
                sort_key.to_vec(),
                row_size,
            ))));
        }
    }

    pub fn len(&self) -> usize {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retained rows in no particular order.
    pub fn snapshot(&self) -> Vec<TopRow> {
        self.heap
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|Reverse(e)| e.0.clone())
            .collect()
    }

    /// Retained rows, largest first.
    pub fn sorted(&self) -> Vec<TopRow> {
        let mut rows = self.snapshot();
        rows.sort_by(|a, b| b.row_size.cmp(&a.row_size));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sizes(rows: &[TopRow]) -> Vec<u64> {
        rows.iter().map(|r| r.row_size).collect()
    }

    #[test]
    fn test_keeps_largest() {
        let top = BoundedTopK::new(3);
        for size in [5, 1, 9, 3, 7] {
            top.push(b"h", b"s", size);
        }
        assert_eq!(sizes(&top.sorted()), vec![9, 7, 5]);
    }

    #[test]
    fn test_ties_keep_existing_entry() {
        let top = BoundedTopK::new(2);
        top.push(b"first", b"", 10);
        top.push(b"second", b"", 10);
        top.push(b"third", b"", 10);

        let mut keys: Vec<_> = top.snapshot().into_iter().map(|r| r.hash_key).collect();
        keys.sort();
        assert_eq!(keys, vec![b"first".to_vec(), b"second".to_vec()]);
    }

    #[test]
    fn test_zero_capacity_is_noop() {
        let top = BoundedTopK::new(0);
        top.push(b"h", b"s", 100);
        assert!(top.is_empty());
        assert!(top.sorted().is_empty());
    }

    #[test]
    fn test_fewer_items_than_capacity() {
        let top = BoundedTopK::new(10);
        top.push(b"a", b"1", 4);
        top.push(b"b", b"2", 8);
        let rows = top.sorted();
        assert_eq!(sizes(&rows), vec![8, 4]);
        assert_eq!(rows[0].hash_key, b"b".to_vec());
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let top = BoundedTopK::new(usize::MAX / 2);
        top.push(b"a", b"", 3);
        top.push(b"b", b"", 1);
        assert_eq!(sizes(&top.sorted()), vec![3, 1]);
    }

    async fn push_concurrently(capacity: usize, rows: Vec<u64>) -> (BoundedTopK, Vec<u64>) {
        let top = Arc::new(BoundedTopK::new(capacity));
        let handles: Vec<_> = rows
            .chunks(rows.len().div_ceil(8).max(1))
            .map(|chunk| {
                let top = top.clone();
                let chunk = chunk.to_vec();
                tokio::spawn(async move {
                    for size in chunk {
                        top.push(&size.to_be_bytes(), b"", size);
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        let top = Arc::try_unwrap(top).unwrap();
        (top, rows)
    }

    fn assert_retention(top: &BoundedTopK, capacity: usize, rows: &[u64]) {
        let kept = sizes(&top.sorted());
        assert_eq!(kept.len(), capacity.min(rows.len()));

        let mut all = rows.to_vec();
        all.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(kept, all[..kept.len()].to_vec());

        if let (Some(min_kept), Some(max_dropped)) = (kept.last(), all.get(kept.len())) {
            assert!(min_kept >= max_dropped);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_push_retains_largest() {
        let cases = [
            (5, (0..1000u64).map(|v| (v * 7919) % 1000).collect::<Vec<_>>()),
            (50, (0..20u64).collect()),
            (16, (0..2000u64).map(|v| v % 3).collect()),
            (1, vec![42; 300]),
            (64, (0..4000u64).map(|v| (v * 31) % 97).collect()),
        ];
        for (capacity, rows) in cases {
            let (top, rows) = push_concurrently(capacity, rows).await;
            assert_retention(&top, capacity, &rows);
        }
    }
}
