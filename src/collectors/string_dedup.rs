//! String content deduplication statistics.

use std::io::{self, Write};

use crate::collectors::{CollectorKind, StatCollector};
use crate::heap::HeapObject;
use crate::histogram::{Histogram, DEFAULT_KEY_WIDTH, DEFAULT_TOP_COUNT};

const STRING_TYPE: &str = "System.String";

/// Exposes duplicate string instances carrying identical content.
///
/// Every readable string at or above the configured minimum length is
/// recorded by exact content; a count above 1 means that many separate
/// instances hold the same text.
#[derive(Debug, Default)]
pub struct StringDedupCollector {
    /// Strings shorter than this many characters are ignored.
    min_chars: usize,
    string_histogram: Histogram<String>,
}

impl StringDedupCollector {
    pub fn new(min_chars: usize) -> Self {
        Self {
            min_chars,
            ..Self::default()
        }
    }

    pub fn merge(&mut self, other: StringDedupCollector) {
        self.string_histogram.merge(other.string_histogram);
    }

    /// Number of distinct string contents observed.
    pub fn distinct_strings(&self) -> usize {
        self.string_histogram.distinct()
    }

    pub fn string_histogram(&self) -> &Histogram<String> {
        &self.string_histogram
    }
}

impl StatCollector for StringDedupCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::StringDedup
    }

    fn display_name(&self) -> &'static str {
        "String Object Stats"
    }

    fn process_object(&mut self, type_name: &str, obj: &dyn HeapObject) {
        if type_name != STRING_TYPE {
            return;
        }
        let Some(content) = obj.read_as_string(usize::MAX) else {
            return;
        };
        if content.chars().count() < self.min_chars {
            return;
        }
        self.string_histogram.add(content);
    }

    fn write_report(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Distinct strings: {}", self.distinct_strings())?;
        writeln!(out, "Histogram of string contents:")?;
        self.string_histogram
            .write_report(out, DEFAULT_TOP_COUNT, DEFAULT_KEY_WIDTH)
    }
}
