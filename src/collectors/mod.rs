//! Statistics collectors and the registry workers build them from.
//!
//! A collector consumes one heap object at a time and accumulates
//! per-type frequency statistics. Each worker owns a private instance of
//! every enabled collector; after the scan the coordinator merges the
//! per-worker instances, keyed by [`CollectorKind`].

pub mod char_set;
pub mod dict_size;
pub mod special_holder;
pub mod string_dedup;
mod tests;

use std::collections::BTreeMap;
use std::io::{self, Write};

pub use char_set::CharSetDedupCollector;
pub use dict_size::DictSizeCollector;
pub use special_holder::SpecialHolderCollector;
pub use string_dedup::StringDedupCollector;

use crate::error::{ScanError, ScanResult};
use crate::heap::HeapObject;

/// The capability set every collector implements.
///
/// `process_object` is called once per live object with a resolved type
/// name; the worker has already filtered null and untyped objects.
pub trait StatCollector {
    /// Stable identity used to pair instances up for merging.
    fn kind(&self) -> CollectorKind;

    /// Human-readable section name for the final report.
    fn display_name(&self) -> &'static str;

    /// Inspect one object and update internal histograms.
    fn process_object(&mut self, type_name: &str, obj: &dyn HeapObject);

    /// Write this collector's statistics to the report sink.
    fn write_report(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// Identity of a collector implementation.
///
/// Merges are keyed by this enum rather than by display name, so two
/// different collector kinds can never be combined by accident.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollectorKind {
    DictSize,
    CharSetDedup,
    StringDedup,
    SpecialHolder,
}

/// Configuration for one enabled collector.
///
/// # Examples
///
/// ```
/// use heapscan::collectors::{CollectorConfig, CollectorKind, StatCollector};
///
/// let config = CollectorConfig::StringDedup { min_chars: 5 };
/// assert_eq!(config.kind(), CollectorKind::StringDedup);
///
/// let collector = config.build();
/// assert_eq!(collector.kind(), CollectorKind::StringDedup);
/// ```
#[derive(Clone, Debug)]
pub enum CollectorConfig {
    DictSize,
    /// Ignore char sets with fewer than `min_live` live entries.
    CharSetDedup { min_live: usize },
    /// Ignore strings shorter than `min_chars` characters.
    StringDedup { min_chars: usize },
    SpecialHolder,
}

impl CollectorConfig {
    pub fn kind(&self) -> CollectorKind {
        match self {
            CollectorConfig::DictSize => CollectorKind::DictSize,
            CollectorConfig::CharSetDedup { .. } => CollectorKind::CharSetDedup,
            CollectorConfig::StringDedup { .. } => CollectorKind::StringDedup,
            CollectorConfig::SpecialHolder => CollectorKind::SpecialHolder,
        }
    }

    /// Build a fresh collector instance for this configuration.
    pub fn build(&self) -> Collector {
        match *self {
            CollectorConfig::DictSize => Collector::DictSize(DictSizeCollector::new()),
            CollectorConfig::CharSetDedup { min_live } => {
                Collector::CharSetDedup(CharSetDedupCollector::new(min_live))
            }
            CollectorConfig::StringDedup { min_chars } => {
                Collector::StringDedup(StringDedupCollector::new(min_chars))
            }
            CollectorConfig::SpecialHolder => {
                Collector::SpecialHolder(SpecialHolderCollector::new())
            }
        }
    }
}

/// A collector instance of one of the four concrete kinds.
///
/// The enum keeps merging typed: pairing two instances goes through
/// [`Collector::merge`], which only combines matching variants.
pub enum Collector {
    DictSize(DictSizeCollector),
    CharSetDedup(CharSetDedupCollector),
    StringDedup(StringDedupCollector),
    SpecialHolder(SpecialHolderCollector),
}

impl Collector {
    /// Fold `other` into `self`. Both sides must be the same kind; the
    /// coordinator guarantees this by keying merges on [`CollectorKind`],
    /// and a mismatch is reported as a hard error rather than dropped.
    pub fn merge(&mut self, other: Collector) -> ScanResult<()> {
        match (self, other) {
            (Collector::DictSize(target), Collector::DictSize(other)) => target.merge(other),
            (Collector::CharSetDedup(target), Collector::CharSetDedup(other)) => {
                target.merge(other)
            }
            (Collector::StringDedup(target), Collector::StringDedup(other)) => target.merge(other),
            (Collector::SpecialHolder(target), Collector::SpecialHolder(other)) => {
                target.merge(other)
            }
            (target, other) => {
                return Err(ScanError::CollectorKindMismatch {
                    target: target.kind(),
                    other: other.kind(),
                });
            }
        }
        Ok(())
    }

    fn inner(&self) -> &dyn StatCollector {
        match self {
            Collector::DictSize(collector) => collector,
            Collector::CharSetDedup(collector) => collector,
            Collector::StringDedup(collector) => collector,
            Collector::SpecialHolder(collector) => collector,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn StatCollector {
        match self {
            Collector::DictSize(collector) => collector,
            Collector::CharSetDedup(collector) => collector,
            Collector::StringDedup(collector) => collector,
            Collector::SpecialHolder(collector) => collector,
        }
    }
}

impl StatCollector for Collector {
    fn kind(&self) -> CollectorKind {
        self.inner().kind()
    }

    fn display_name(&self) -> &'static str {
        self.inner().display_name()
    }

    fn process_object(&mut self, type_name: &str, obj: &dyn HeapObject) {
        self.inner_mut().process_object(type_name, obj);
    }

    fn write_report(&self, out: &mut dyn Write) -> io::Result<()> {
        self.inner().write_report(out)
    }
}

type CollectorFactory = Box<dyn Fn() -> Collector + Send + Sync>;

/// Maps each enabled [`CollectorKind`] to a zero-argument factory that
/// produces a fresh instance.
///
/// Workers build their private collector sets from the registry, so
/// adding a collector never touches worker construction: define the
/// kind, the config variant, and register it.
///
/// # Examples
///
/// ```
/// use heapscan::collectors::{CollectorConfig, CollectorRegistry};
///
/// let mut registry = CollectorRegistry::new();
/// registry.enable(CollectorConfig::DictSize);
/// registry.enable(CollectorConfig::StringDedup { min_chars: 8 });
///
/// let set = registry.build_set();
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Default)]
pub struct CollectorRegistry {
    factories: BTreeMap<CollectorKind, CollectorFactory>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `config`'s kind. Enabling the same kind
    /// twice keeps the latest configuration.
    pub fn enable(&mut self, config: CollectorConfig) {
        self.register(config.kind(), Box::new(move || config.build()));
    }

    /// Register an arbitrary factory under `kind`.
    pub fn register(&mut self, kind: CollectorKind, factory: CollectorFactory) {
        self.factories.insert(kind, factory);
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Build one fresh instance of every registered collector, in
    /// `CollectorKind` order. Each call produces independent state.
    pub fn build_set(&self) -> Vec<Collector> {
        self.factories.values().map(|factory| factory()).collect()
    }
}
