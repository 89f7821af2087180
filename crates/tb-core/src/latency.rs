//! Histogram of FIFO-to-wire latency.
//!
//! The scheduler stamps each packet when its length is read and records the
//! elapsed time once the datagram has been handed to the socket. Bins are
//! 100 ns wide and cover 0–1 ms; slower samples land in the last bin while
//! `max_ns` keeps the true value.

/// Width of each histogram bin in nanoseconds.
const BIN_WIDTH_NS: u64 = 100;

/// Number of histogram bins (covers 0–1ms).
const NUM_BINS: usize = 10_000;

/// Computed latency statistics.
#[derive(Debug, Clone, Copy)]
pub struct LatencyStats {
    pub count: u64,
    pub min_ns: u64,
    pub max_ns: u64,
    pub avg_ns: f64,
    pub p50_ns: u64,
    pub p99_ns: u64,
}

impl std::fmt::Display for LatencyStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} min={}ns max={}ns avg={:.0}ns p50={}ns p99={}ns",
            self.count, self.min_ns, self.max_ns, self.avg_ns, self.p50_ns, self.p99_ns,
        )
    }
}

/// A histogram-based latency collector owned by the polling loop.
pub struct LatencyCollector {
    bins: Vec<u64>,
    count: u64,
    sum: u64,
    min: u64,
    max: u64,
}

impl LatencyCollector {
    pub fn new() -> Self {
        Self { bins: vec![0u64; NUM_BINS], count: 0, sum: 0, min: u64::MAX, max: 0 }
    }

    /// Record one sample in nanoseconds.
    #[inline]
    pub fn record(&mut self, latency_ns: u64) {
        self.count += 1;
        self.sum = self.sum.saturating_add(latency_ns);
        self.min = self.min.min(latency_ns);
        self.max = self.max.max(latency_ns);

        let bin = ((latency_ns / BIN_WIDTH_NS) as usize).min(NUM_BINS - 1);
        self.bins[bin] += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Summary statistics, or `None` if nothing was recorded.
    pub fn stats(&self) -> Option<LatencyStats> {
        if self.count == 0 {
            return None;
        }
        Some(LatencyStats {
            count: self.count,
            min_ns: self.min,
            max_ns: self.max,
            avg_ns: self.sum as f64 / self.count as f64,
            p50_ns: self.percentile(0.50),
            p99_ns: self.percentile(0.99),
        })
    }

    pub fn reset(&mut self) {
        self.bins.fill(0);
        self.count = 0;
        self.sum = 0;
        self.min = u64::MAX;
        self.max = 0;
    }

    fn percentile(&self, pct: f64) -> u64 {
        let target = (self.count as f64 * pct).ceil() as u64;
        let mut cumulative = 0u64;
        for (i, &count) in self.bins.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                return (i as u64) * BIN_WIDTH_NS;
            }
        }
        self.max
    }
}

impl Default for LatencyCollector {
    fn default() -> Self {
        Self::new()
    }
}
