use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nalgebra::DMatrix;

/// Streaming mean/variance accumulator (Welford's algorithm).
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// NaN when empty.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.mean
        }
    }

    /// Population standard deviation, NaN when empty.
    pub fn std_dev(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = RunningStats::new();
        for x in iter {
            stats.push(x);
        }
        stats
    }
}

/// Median of `values`, reordering them in place. NaN when empty.
pub fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        upper
    } else {
        // the lower half holds everything below `mid`; its max is the other middle value
        let lower_max = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (lower_max + upper) / 2.0
    }
}

/// Statistics of one (channel, pixel) cell within one chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStatistics {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub n_samples: usize,
}

impl CellStatistics {
    pub const INVALID: CellStatistics = CellStatistics {
        mean: f64::NAN,
        median: f64::NAN,
        std: f64::NAN,
        n_samples: 0,
    };

    /// Plain statistics over all of `values` (reordered in place).
    pub fn from_values(values: &mut [f64]) -> Self {
        if values.is_empty() {
            return Self::INVALID;
        }
        let running: RunningStats = values.iter().copied().collect();
        CellStatistics {
            mean: running.mean(),
            median: median(values),
            std: running.std_dev(),
            n_samples: values.len(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.n_samples > 0
    }
}

/// Per-channel, per-pixel statistics of one chunk.
///
/// Cells without any usable sample hold NaN in `mean`, `median` and `std`
/// and zero in `n_samples`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRecord {
    pub extraction_start: DateTime<Utc>,
    pub extraction_stop: DateTime<Utc>,
    pub mean: DMatrix<f64>,
    pub median: DMatrix<f64>,
    pub std: DMatrix<f64>,
    pub n_samples: DMatrix<usize>,
}

impl StatisticsRecord {
    pub(crate) fn from_cells(
        extraction_start: DateTime<Utc>,
        extraction_stop: DateTime<Utc>,
        cells: &DMatrix<CellStatistics>,
    ) -> Self {
        Self {
            extraction_start,
            extraction_stop,
            mean: cells.map(|c| c.mean),
            median: cells.map(|c| c.median),
            std: cells.map(|c| c.std),
            n_samples: cells.map(|c| c.n_samples),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.mean.shape()
    }

    pub fn is_valid(&self, channel: usize, pixel: usize) -> bool {
        self.n_samples[(channel, pixel)] > 0
    }

    /// `(channel, pixel)` of every cell without a usable sample.
    pub fn invalid_cells(&self) -> Vec<(usize, usize)> {
        let (channels, pixels) = self.shape();
        (0..channels)
            .flat_map(|c| (0..pixels).map(move |p| (c, p)))
            .filter(|&(c, p)| !self.is_valid(c, p))
            .collect()
    }
}

/// Chunk statistics keyed by the timestamp of each chunk's first sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChunkStatistics {
    records: BTreeMap<DateTime<Utc>, StatisticsRecord>,
}

impl ChunkStatistics {
    pub(crate) fn insert(&mut self, key: DateTime<Utc>, record: StatisticsRecord) {
        self.records.insert(key, record);
    }

    pub fn get(&self, timestamp: &DateTime<Utc>) -> Option<&StatisticsRecord> {
        self.records.get(timestamp)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<(&DateTime<Utc>, &StatisticsRecord)> {
        self.records.iter().next()
    }

    /// Records in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&DateTime<Utc>, &StatisticsRecord)> {
        self.records.iter()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &DateTime<Utc>> {
        self.records.keys()
    }
}

impl<'a> IntoIterator for &'a ChunkStatistics {
    type Item = (&'a DateTime<Utc>, &'a StatisticsRecord);
    type IntoIter = std::collections::btree_map::Iter<'a, DateTime<Utc>, StatisticsRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
