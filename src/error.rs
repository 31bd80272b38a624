//! Error types for the heap scan pipeline.

use std::io;

use thiserror::Error;

use crate::collectors::CollectorKind;

/// Errors that can end a scan.
///
/// Per-object conditions (unresolved types, null references, unreadable
/// fields) are not errors: the provider reports them as `None` and the
/// collectors skip the object or field. Only failures that prevent the
/// pipeline itself from running or reporting surface here.
///
/// # Examples
///
/// ```
/// use heapscan::error::{ScanError, ScanResult};
///
/// fn report() -> ScanResult<usize> {
///     Ok(42)
/// }
///
/// assert_eq!(report().unwrap(), 42);
/// ```
#[derive(Debug, Error)]
pub enum ScanError {
    /// A worker thread could not be spawned.
    #[error("failed to spawn scan worker {worker_id}: {source}")]
    WorkerSpawn {
        worker_id: usize,
        #[source]
        source: io::Error,
    },
    /// Writing the final report to the output sink failed.
    #[error("failed to write report: {0}")]
    Report(#[from] io::Error),
    /// Two collectors of different kinds were asked to merge.
    ///
    /// The coordinator keys merges by [`CollectorKind`], so this cannot
    /// happen during a normal scan; it exists so a cross-kind merge is a
    /// hard failure instead of a silent drop.
    #[error("cannot merge collector {other:?} into {target:?}")]
    CollectorKindMismatch {
        target: CollectorKind,
        other: CollectorKind,
    },
}

/// Result type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_readable_messages() {
        let err = ScanError::CollectorKindMismatch {
            target: CollectorKind::DictSize,
            other: CollectorKind::StringDedup,
        };
        assert_eq!(
            err.to_string(),
            "cannot merge collector StringDedup into DictSize"
        );
    }

    #[test]
    fn io_errors_convert_into_report_errors() {
        fn write_somewhere() -> ScanResult<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))?;
            Ok(())
        }

        let err = write_somewhere().unwrap_err();
        assert!(matches!(err, ScanError::Report(_)));
    }
}
