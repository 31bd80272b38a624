//! Scan configuration surface.

use std::time::Duration;

use crate::collectors::{CollectorConfig, CollectorRegistry};

/// Worker threads per unit of available parallelism.
///
/// Walking a snapshot is read-heavy and frequently stalls on the
/// provider, so the pool is oversubscribed; the multiplier was tuned
/// empirically, not derived from workload.
pub const DEFAULT_WORKER_MULTIPLIER: usize = 3;

/// Fixed wall-clock period between progress reports.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for one scan run.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use heapscan::collectors::CollectorConfig;
/// use heapscan::options::ScanOptions;
///
/// let options = ScanOptions::default()
///     .with_collector(CollectorConfig::DictSize)
///     .with_collector(CollectorConfig::StringDedup { min_chars: 8 })
///     .with_segment_limit(100)
///     .with_poll_interval(Duration::from_millis(200));
///
/// assert_eq!(options.collectors.len(), 2);
/// assert_eq!(options.segment_limit, Some(100));
/// ```
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Collectors enabled for this run. No collectors means the scan
    /// drains segments but gathers nothing.
    pub collectors: Vec<CollectorConfig>,
    /// Stop feeding segments into the queue after this many. `None`
    /// scans the whole snapshot.
    pub segment_limit: Option<usize>,
    /// Worker threads per unit of available parallelism, minimum 1.
    pub worker_multiplier: usize,
    /// Period between `progress(completed, total)` invocations.
    pub poll_interval: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            collectors: Vec::new(),
            segment_limit: None,
            worker_multiplier: DEFAULT_WORKER_MULTIPLIER,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ScanOptions {
    /// Options with every collector enabled, thresholds set to
    /// `min_size`.
    pub fn all_collectors(min_size: usize) -> Self {
        Self::default()
            .with_collector(CollectorConfig::DictSize)
            .with_collector(CollectorConfig::SpecialHolder)
            .with_collector(CollectorConfig::CharSetDedup { min_live: min_size })
            .with_collector(CollectorConfig::StringDedup { min_chars: min_size })
    }

    pub fn with_collector(mut self, config: CollectorConfig) -> Self {
        self.collectors.push(config);
        self
    }

    pub fn with_segment_limit(mut self, limit: usize) -> Self {
        self.segment_limit = Some(limit);
        self
    }

    pub fn with_worker_multiplier(mut self, multiplier: usize) -> Self {
        self.worker_multiplier = multiplier;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build the collector registry for this configuration.
    pub fn registry(&self) -> CollectorRegistry {
        let mut registry = CollectorRegistry::new();
        for config in &self.collectors {
            registry.enable(config.clone());
        }
        registry
    }
}
