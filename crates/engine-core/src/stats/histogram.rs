//! Lock-free size histogram with exponentially growing buckets.
//!
//! Bucket limits are `1, 2`, then each previous unrounded limit times 1.5,
//! truncated to two significant digits (`3, 4, 6, 10, 15, 22, 34, 51, 76,
//! 110, 170, ...`). Bucket `i` holds values in `(limit[i - 1], limit[i]]`;
//! values above the last limit land in the last bucket.

use serde::Serialize;
use std::sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
};

fn bucket_limits() -> &'static [u64] {
    static LIMITS: OnceLock<Vec<u64>> = OnceLock::new();
    LIMITS.get_or_init(|| {
        let mut limits = vec![1u64, 2];
        let mut next = 2.0f64;
        loop {
            next *= 1.5;
            if next > u64::MAX as f64 {
                break;
            }
            let mut limit = next as u64;
            let mut pow_of_ten = 1u64;
            while limit / 10 > 10 {
                limit /= 10;
                pow_of_ten *= 10;
            }
            limits.push(limit * pow_of_ten);
        }
        limits
    })
}

fn bucket_index(value: u64) -> usize {
    let limits = bucket_limits();
    limits
        .partition_point(|&limit| limit < value)
        .min(limits.len() - 1)
}

/// Concurrent histogram shared by every unit of a split.
pub struct Histogram {
    count: AtomicU64,
    sum: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
    sum_squares: AtomicU64,
    buckets: Box<[AtomicU64]>,
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            min: AtomicU64::new(u64::MAX),
            max: AtomicU64::new(0),
            sum_squares: AtomicU64::new(0f64.to_bits()),
            buckets: bucket_limits().iter().map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn record(&self, value: u64) {
        self.buckets[bucket_index(value)].fetch_add(1, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(value, Ordering::Relaxed);
        self.min.fetch_min(value, Ordering::Relaxed);
        self.max.fetch_max(value, Ordering::Relaxed);

        let square = (value as f64) * (value as f64);
        let _ = self
            .sum_squares
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + square).to_bits())
            });
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let count = self.count.load(Ordering::Relaxed);
        HistogramSnapshot {
            count,
            sum: self.sum.load(Ordering::Relaxed),
            sum_squares: f64::from_bits(self.sum_squares.load(Ordering::Relaxed)),
            min: if count == 0 {
                0
            } else {
                self.min.load(Ordering::Relaxed)
            },
            max: self.max.load(Ordering::Relaxed),
            buckets: self
                .buckets
                .iter()
                .map(|b| b.load(Ordering::Relaxed))
                .collect(),
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Histogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snap = self.snapshot();
        f.debug_struct("Histogram")
            .field("count", &snap.count)
            .field("min", &snap.min)
            .field("max", &snap.max)
            .finish()
    }
}

/// Point-in-time copy of a [`Histogram`]; snapshots of different splits merge.
/// Serializes as its [`HistogramSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "HistogramSummary")]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum: u64,
    pub sum_squares: f64,
    pub min: u64,
    pub max: u64,
    pub buckets: Vec<u64>,
}

impl Default for HistogramSnapshot {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0,
            sum_squares: 0.0,
            min: 0,
            max: 0,
            buckets: vec![0; bucket_limits().len()],
        }
    }
}

impl HistogramSnapshot {
    pub fn merge(&mut self, other: &HistogramSnapshot) {
        if other.count == 0 {
            return;
        }
        self.min = if self.count == 0 {
            other.min
        } else {
            self.min.min(other.min)
        };
        self.max = self.max.max(other.max);
        self.count += other.count;
        self.sum += other.sum;
        self.sum_squares += other.sum_squares;
        if self.buckets.len() < other.buckets.len() {
            self.buckets.resize(other.buckets.len(), 0);
        }
        for (mine, theirs) in self.buckets.iter_mut().zip(&other.buckets) {
            *mine += theirs;
        }
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64
    }

    pub fn median(&self) -> f64 {
        self.percentile(50.0)
    }

    /// Interpolates linearly inside the bucket holding the `p`th percentile,
    /// clamped to the observed min and max.
    pub fn percentile(&self, p: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let limits = bucket_limits();
        let threshold = self.count as f64 * (p / 100.0);
        let mut cumulative = 0u64;
        for (idx, &in_bucket) in self.buckets.iter().enumerate() {
            cumulative += in_bucket;
            if (cumulative as f64) < threshold {
                continue;
            }
            let left_point = (if idx == 0 { 0 } else { limits[idx - 1] }) as f64;
            let right_point = limits[idx.min(limits.len() - 1)] as f64;
            let left_sum = (cumulative - in_bucket) as f64;
            let pos = if in_bucket == 0 {
                0.0
            } else {
                (threshold - left_sum) / in_bucket as f64
            };
            let r = left_point + (right_point - left_point) * pos;
            return r.clamp(self.min as f64, self.max as f64);
        }
        self.max as f64
    }

    pub fn std_dev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        let sum = self.sum as f64;
        let variance = (self.sum_squares * n - sum * sum) / (n * n);
        variance.max(0.0).sqrt()
    }

    pub fn summary(&self) -> HistogramSummary {
        HistogramSummary {
            count: self.count,
            min: self.min,
            max: self.max,
            average: self.average(),
            median: self.median(),
            p90: self.percentile(90.0),
            p95: self.percentile(95.0),
            p99: self.percentile(99.0),
            std_dev: self.std_dev(),
        }
    }
}

impl From<HistogramSnapshot> for HistogramSummary {
    fn from(snapshot: HistogramSnapshot) -> Self {
        snapshot.summary()
    }
}

/// Statistics derived from a snapshot, as printed in reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSummary {
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub average: f64,
    pub median: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub std_dev: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_bucket_limits_prefix() {
        assert_eq!(
            &bucket_limits()[..12],
            &[1, 2, 3, 4, 6, 10, 15, 22, 34, 51, 76, 110]
        );
    }

    #[test]
    fn test_bucket_index_upper_inclusive() {
        assert_eq!(bucket_index(0), 0);
        assert_eq!(bucket_index(1), 0);
        assert_eq!(bucket_index(2), 1);
        assert_eq!(bucket_index(5), 4);
        assert_eq!(bucket_index(6), 4);
        assert_eq!(bucket_index(u64::MAX), bucket_limits().len() - 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = Histogram::new().snapshot();
        assert_eq!(snap.count, 0);
        assert_eq!(snap.min, 0);
        assert_eq!(snap.average(), 0.0);
        assert_eq!(snap.percentile(99.0), 0.0);
        assert_eq!(snap.std_dev(), 0.0);
    }

    #[test]
    fn test_record_tracks_min_max_sum() {
        let h = Histogram::new();
        for v in [4, 10, 10, 16] {
            h.record(v);
        }
        let snap = h.snapshot();
        assert_eq!(snap.count, 4);
        assert_eq!(snap.sum, 40);
        assert_eq!(snap.min, 4);
        assert_eq!(snap.max, 16);
        assert_eq!(snap.average(), 10.0);
        assert!((snap.std_dev() - 18f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_clamped_to_observed_range() {
        let h = Histogram::new();
        for _ in 0..100 {
            h.record(100);
        }
        let snap = h.snapshot();
        assert_eq!(snap.median(), 100.0);
        assert_eq!(snap.percentile(99.0), 100.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let h = Histogram::new();
        for v in 1..=100 {
            h.record(v);
        }
        let snap = h.snapshot();
        let p50 = snap.median();
        let p99 = snap.percentile(99.0);
        assert!((40.0..=60.0).contains(&p50), "p50 = {p50}");
        assert!(p99 > p50 && p99 <= 100.0, "p99 = {p99}");
    }

    #[test]
    fn test_merge_snapshots() {
        let a = Histogram::new();
        let b = Histogram::new();
        a.record(3);
        b.record(50);
        b.record(7);

        let mut merged = HistogramSnapshot::default();
        merged.merge(&a.snapshot());
        merged.merge(&b.snapshot());

        assert_eq!(merged.count, 3);
        assert_eq!(merged.sum, 60);
        assert_eq!(merged.min, 3);
        assert_eq!(merged.max, 50);
        assert_eq!(merged.buckets.iter().sum::<u64>(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_record() {
        let h = Arc::new(Histogram::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let h = h.clone();
                tokio::spawn(async move {
                    for v in 1..=1000u64 {
                        h.record(v);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        let snap = h.snapshot();
        assert_eq!(snap.count, 8000);
        assert_eq!(snap.sum, 8 * 500_500);
        assert_eq!(snap.min, 1);
        assert_eq!(snap.max, 1000);
    }
}
