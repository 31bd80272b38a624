//! Scan coordinator: queue construction, worker pool, progress polling,
//! and the final merge-and-report step.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::Write;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use crate::cancel::CancellationToken;
use crate::collectors::{Collector, CollectorKind, StatCollector};
use crate::error::{ScanError, ScanResult};
use crate::heap::{HeapProvider, HeapSegment};
use crate::options::ScanOptions;
use crate::worker::{SegmentWorker, WorkerProgress};

/// Totals for one completed scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanSummary {
    /// Segments fed into the queue (bounded by the segment limit).
    pub segments_queued: usize,
    /// Segments fully consumed across all workers. Less than
    /// `segments_queued` when the scan was cancelled.
    pub segments_completed: usize,
    /// Size of the worker pool.
    pub workers: usize,
}

/// Runs the whole pipeline: feeds segments from the Heap Provider to a
/// fixed pool of workers, polls their progress, merges every worker's
/// collectors by kind, and writes the merged reports.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use heapscan::coordinator::ScanCoordinator;
/// use heapscan::options::ScanOptions;
/// use heapscan::test_heap::{TestHeap, TestObject};
///
/// let heap = TestHeap::new()
///     .with_segment(vec![TestObject::string("hello"), TestObject::string("hello")]);
/// let options = ScanOptions::all_collectors(0).with_poll_interval(Duration::from_millis(10));
///
/// let coordinator = ScanCoordinator::new(Arc::new(heap), options);
/// let mut report: Vec<u8> = Vec::new();
/// let summary = coordinator.run(&mut report, |_completed, _total| {}).unwrap();
///
/// assert_eq!(summary.segments_queued, 1);
/// assert_eq!(summary.segments_completed, 1);
/// ```
pub struct ScanCoordinator {
    provider: Arc<dyn HeapProvider>,
    options: ScanOptions,
    cancel: CancellationToken,
}

impl ScanCoordinator {
    pub fn new(provider: Arc<dyn HeapProvider>, options: ScanOptions) -> Self {
        Self {
            provider,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels this coordinator's scan. Raising it mid-scan
    /// stops the workers at their next queue-take; statistics gathered
    /// so far still reach the final report.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute the scan and write every merged collector report to
    /// `output`. `progress(completed, total)` fires once per poll tick
    /// and once more with the final counts.
    pub fn run(
        &self,
        output: &mut dyn Write,
        mut progress: impl FnMut(usize, usize),
    ) -> ScanResult<ScanSummary> {
        let registry = self.options.registry();
        let workers = self.worker_count();
        let (segment_sender, segment_receiver) = flume::unbounded::<Box<dyn HeapSegment>>();

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let worker = SegmentWorker::new(
                worker_id,
                segment_receiver.clone(),
                registry.build_set(),
                self.cancel.clone(),
            );
            let watch = worker.progress();
            let join = thread::Builder::new()
                .name(format!("heap-scan-{worker_id}"))
                .spawn(move || worker.drain())
                .map_err(|source| ScanError::WorkerSpawn { worker_id, source })?;
            handles.push((watch, join));
        }
        drop(segment_receiver);

        let segments_queued = self.enqueue_segments(&segment_sender);
        // Dropping the producer side is the no-more-segments signal.
        drop(segment_sender);
        tracing::info!(workers, segments = segments_queued, "heap scan started");

        loop {
            let all_finished = handles.iter().all(|(watch, _)| watch.is_finished());
            let completed = completed_segments(handles.iter().map(|(watch, _)| watch));
            progress(completed, segments_queued);
            if all_finished {
                break;
            }
            thread::sleep(self.options.poll_interval);
        }

        let segments_completed = completed_segments(handles.iter().map(|(watch, _)| watch));
        let mut worker_outputs = Vec::with_capacity(handles.len());
        for (worker_id, (_, join)) in handles.into_iter().enumerate() {
            match join.join() {
                Ok(collectors) => worker_outputs.push(collectors),
                // A panicked worker loses its statistics; the scan still
                // reports everyone else's.
                Err(_) => tracing::warn!(worker_id, "worker thread panicked, statistics lost"),
            }
        }

        let merged = merge_collectors(worker_outputs)?;
        write_reports(output, &merged)?;
        tracing::info!(
            segments = segments_completed,
            collectors = merged.len(),
            "heap scan finished"
        );

        Ok(ScanSummary {
            segments_queued,
            segments_completed,
            workers,
        })
    }

    fn worker_count(&self) -> usize {
        let parallelism = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        (self.options.worker_multiplier * parallelism).max(1)
    }

    fn enqueue_segments(&self, queue: &flume::Sender<Box<dyn HeapSegment>>) -> usize {
        let limit = self.options.segment_limit.unwrap_or(usize::MAX);
        let mut queued = 0;
        for segment in self.provider.segments() {
            if queued >= limit {
                break;
            }
            // Send only fails when every worker is already gone.
            if queue.send(segment).is_err() {
                break;
            }
            queued += 1;
        }
        queued
    }
}

fn completed_segments<'a>(watches: impl Iterator<Item = &'a WorkerProgress>) -> usize {
    watches.map(WorkerProgress::completed_segments).sum()
}

/// Merge every worker's collector set into one instance per kind.
///
/// Keying by [`CollectorKind`] makes a cross-kind merge impossible
/// during a scan; worker order does not affect the result because each
/// collector's merge is commutative and associative.
pub fn merge_collectors(
    worker_outputs: Vec<Vec<Collector>>,
) -> ScanResult<BTreeMap<CollectorKind, Collector>> {
    let mut merged: BTreeMap<CollectorKind, Collector> = BTreeMap::new();
    for collectors in worker_outputs {
        for collector in collectors {
            match merged.entry(collector.kind()) {
                Entry::Occupied(mut slot) => slot.get_mut().merge(collector)?,
                Entry::Vacant(slot) => {
                    slot.insert(collector);
                }
            }
        }
    }
    Ok(merged)
}

fn write_reports(
    output: &mut dyn Write,
    merged: &BTreeMap<CollectorKind, Collector>,
) -> ScanResult<()> {
    for collector in merged.values() {
        writeln!(output, "Stats: {}:", collector.display_name())?;
        writeln!(output, "====================")?;
        collector.write_report(output)?;
        writeln!(output)?;
    }
    Ok(())
}
