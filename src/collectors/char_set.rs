//! Character-set content deduplication statistics.

use std::collections::BTreeSet;
use std::io::{self, Write};

use crate::collectors::dict_size::{FIELD_COUNT, FIELD_ENTRIES, FIELD_FREE_COUNT};
use crate::collectors::{CollectorKind, StatCollector};
use crate::heap::HeapObject;
use crate::histogram::{Histogram, DEFAULT_KEY_WIDTH, DEFAULT_TOP_COUNT};

const CHAR_SET_TYPE: &str = "System.Collections.Generic.HashSet<System.Char>";

/// Occupancy link of a hash-set slot; values below -1 mark free slots.
const FIELD_SLOT_NEXT: &str = "Next";
/// Character payload of an occupied hash-set slot.
const FIELD_SLOT_VALUE: &str = "Value";

/// Detects hash-sets-of-characters with identical content.
///
/// Each qualifying set is canonicalized into a sorted string of its
/// distinct characters; a histogram over those canonical strings exposes
/// how many separate set instances carry the same content. A second
/// histogram tracks final set sizes.
#[derive(Debug, Default)]
pub struct CharSetDedupCollector {
    /// Sets with fewer live entries than this are ignored entirely.
    min_live: usize,
    set_histogram: Histogram<String>,
    size_histogram: Histogram<u64>,
}

/// Canonical form of a character set: its distinct characters in
/// ascending order, the empty string for an empty set.
pub fn canonical_string(chars: &BTreeSet<char>) -> String {
    chars.iter().collect()
}

impl CharSetDedupCollector {
    pub fn new(min_live: usize) -> Self {
        Self {
            min_live,
            ..Self::default()
        }
    }

    pub fn merge(&mut self, other: CharSetDedupCollector) {
        self.set_histogram.merge(other.set_histogram);
        self.size_histogram.merge(other.size_histogram);
    }

    /// Number of distinct canonical strings observed.
    pub fn distinct_sets(&self) -> usize {
        self.set_histogram.distinct()
    }

    pub fn set_histogram(&self) -> &Histogram<String> {
        &self.set_histogram
    }

    pub fn size_histogram(&self) -> &Histogram<u64> {
        &self.size_histogram
    }
}

impl StatCollector for CharSetDedupCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::CharSetDedup
    }

    fn display_name(&self) -> &'static str {
        "HashSet<Char> Stats"
    }

    fn process_object(&mut self, type_name: &str, obj: &dyn HeapObject) {
        if type_name != CHAR_SET_TYPE {
            return;
        }
        let Some(raw) = obj.read_int_field(FIELD_COUNT) else {
            return;
        };
        if raw <= 0 {
            return;
        }
        let Some(free) = obj.read_int_field(FIELD_FREE_COUNT) else {
            return;
        };
        if raw - free < self.min_live as i64 {
            return;
        }
        let Some(slots) = obj.read_array_field(FIELD_ENTRIES) else {
            return;
        };

        // Slots at indices past the raw count have never been used, so
        // only the first `raw` slots are inspected. Duplicate characters
        // across occupied slots collapse in the working set.
        let mut contents = BTreeSet::new();
        for index in 0..raw as usize {
            let Some(slot) = slots.struct_at(index) else {
                break;
            };
            let Some(next) = slot.read_int_field(FIELD_SLOT_NEXT) else {
                continue;
            };
            if next >= -1 {
                if let Some(value) = slot.read_char_field(FIELD_SLOT_VALUE) {
                    contents.insert(value);
                }
            }
        }

        self.size_histogram.add(contents.len() as u64);
        self.set_histogram.add(canonical_string(&contents));
    }

    fn write_report(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Distinct canonical sets: {}", self.distinct_sets())?;
        writeln!(out, "Histogram of canonical set contents:")?;
        self.set_histogram
            .write_report(out, DEFAULT_TOP_COUNT, DEFAULT_KEY_WIDTH)?;
        writeln!(out, "Histogram of set sizes:")?;
        self.size_histogram
            .write_report(out, DEFAULT_TOP_COUNT, DEFAULT_KEY_WIDTH)
    }
}
