//! Statistical profiler for the live-object graph of a captured process
//! memory snapshot.
//!
//! A [`coordinator::ScanCoordinator`] feeds heap segments from an
//! external [`heap::HeapProvider`] into a shared queue; a fixed pool of
//! [`worker::SegmentWorker`]s drains it, running every live object
//! through each worker's private set of statistics collectors. When all
//! workers finish, the per-worker collectors are merged by
//! [`collectors::CollectorKind`] and the combined statistics are written
//! as one report.

pub mod cancel;
pub mod collectors;
pub mod coordinator;
pub mod error;
pub mod heap;
pub mod histogram;
pub mod options;
pub mod test_heap;
pub mod worker;

pub use cancel::CancellationToken;
pub use collectors::{Collector, CollectorConfig, CollectorKind, CollectorRegistry, StatCollector};
pub use coordinator::{ScanCoordinator, ScanSummary};
pub use error::{ScanError, ScanResult};
pub use heap::{HeapArray, HeapObject, HeapProvider, HeapSegment};
pub use histogram::Histogram;
pub use options::ScanOptions;
pub use worker::{SegmentWorker, WorkerPhase, WorkerProgress};
