//! Segment worker: drains the shared queue and feeds objects to its
//! private collector set.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use flume::{Receiver, RecvTimeoutError};

use crate::cancel::CancellationToken;
use crate::collectors::{Collector, StatCollector};
use crate::heap::HeapSegment;

/// How long a queue-take blocks before the worker re-checks the
/// cancellation flag.
const TAKE_POLL: Duration = Duration::from_millis(50);

/// Lifecycle of one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerPhase {
    Idle,
    Draining,
    Finished,
}

/// Coordinator-side view of one worker's progress.
///
/// Both fields are readable at any time without making the worker
/// pause: the completed-segment counter is a relaxed atomic and the
/// phase is a lock-free swap cell.
#[derive(Clone)]
pub struct WorkerProgress {
    completed_segments: Arc<AtomicUsize>,
    phase: Arc<ArcSwap<WorkerPhase>>,
}

impl WorkerProgress {
    /// Segments this worker has fully consumed so far.
    pub fn completed_segments(&self) -> usize {
        self.completed_segments.load(Ordering::Relaxed)
    }

    pub fn phase(&self) -> WorkerPhase {
        **self.phase.load()
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == WorkerPhase::Finished
    }
}

/// Pulls heap segments off the shared queue and runs every owned
/// collector over each live object.
///
/// A worker owns its collector set outright for the whole scan — no
/// histogram is ever shared between threads. The set is handed back as
/// the return value of [`SegmentWorker::drain`], which runs on the
/// worker's own thread; the coordinator receives it through the thread
/// join once the worker has finished.
///
/// # Examples
///
/// ```
/// use heapscan::cancel::CancellationToken;
/// use heapscan::options::ScanOptions;
/// use heapscan::worker::{SegmentWorker, WorkerPhase};
///
/// let (sender, receiver) = flume::unbounded();
/// let registry = ScanOptions::all_collectors(0).registry();
/// let worker = SegmentWorker::new(0, receiver, registry.build_set(), CancellationToken::new());
/// assert_eq!(worker.progress().phase(), WorkerPhase::Idle);
///
/// drop(sender); // queue closed and empty: drain finishes immediately
/// let collectors = worker.drain();
/// assert_eq!(collectors.len(), 4);
/// ```
pub struct SegmentWorker {
    worker_id: usize,
    queue: Receiver<Box<dyn HeapSegment>>,
    collectors: Vec<Collector>,
    cancel: CancellationToken,
    completed_segments: Arc<AtomicUsize>,
    phase: Arc<ArcSwap<WorkerPhase>>,
}

impl SegmentWorker {
    pub fn new(
        worker_id: usize,
        queue: Receiver<Box<dyn HeapSegment>>,
        collectors: Vec<Collector>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            worker_id,
            queue,
            collectors,
            cancel,
            completed_segments: Arc::new(AtomicUsize::new(0)),
            phase: Arc::new(ArcSwap::from_pointee(WorkerPhase::Idle)),
        }
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Progress handle for the polling thread. Cheap to clone; stays
    /// valid after the worker has been moved onto its thread.
    pub fn progress(&self) -> WorkerProgress {
        WorkerProgress {
            completed_segments: Arc::clone(&self.completed_segments),
            phase: Arc::clone(&self.phase),
        }
    }

    /// Consume segments until the queue is closed and empty or
    /// cancellation is observed, then return the collector set.
    ///
    /// Cancellation is checked at every queue-take; it is logged, never
    /// propagated, and whatever statistics were gathered up to that
    /// point remain in the returned collectors.
    pub fn drain(mut self) -> Vec<Collector> {
        self.phase.store(Arc::new(WorkerPhase::Draining));
        loop {
            if self.cancel.is_cancelled() {
                tracing::info!(
                    worker_id = self.worker_id,
                    "cancellation requested, shutting down"
                );
                break;
            }
            match self.queue.recv_timeout(TAKE_POLL) {
                Ok(segment) => {
                    self.process_segment(segment.as_ref());
                    self.completed_segments.fetch_add(1, Ordering::Relaxed);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.phase.store(Arc::new(WorkerPhase::Finished));
        tracing::debug!(
            worker_id = self.worker_id,
            segments = self.completed_segments.load(Ordering::Relaxed),
            "worker finished"
        );
        self.collectors
    }

    fn process_segment(&mut self, segment: &dyn HeapSegment) {
        for obj in segment.objects() {
            // Null or untyped objects carry nothing to classify.
            let Some(type_name) = obj.type_name() else {
                continue;
            };
            for collector in &mut self.collectors {
                collector.process_object(&type_name, obj.as_ref());
            }
        }
    }
}
