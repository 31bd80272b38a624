//! Dictionary sizing statistics.

use std::io::{self, Write};

use crate::collectors::{CollectorKind, StatCollector};
use crate::heap::HeapObject;
use crate::histogram::{Histogram, DEFAULT_KEY_WIDTH, DEFAULT_TOP_COUNT};

/// Prefix/suffix pair matched against dictionary-style collection type
/// names (`Dictionary<K, V>` instantiations).
const DICTIONARY_PREFIX: &str = "System.Collections.Generic.Dictionary<";
const DICTIONARY_SUFFIX: &str = ">";

/// Raw slot count of a hash-backed collection.
pub(crate) const FIELD_COUNT: &str = "_count";
/// Slots parked on the collection's free list.
pub(crate) const FIELD_FREE_COUNT: &str = "_freeCount";
/// Backing entries array of a hash-backed collection.
pub(crate) const FIELD_ENTRIES: &str = "_entries";

/// Whether `type_name` is a dictionary-style collection instantiation.
pub fn is_dictionary_type(type_name: &str) -> bool {
    type_name.starts_with(DICTIONARY_PREFIX) && type_name.ends_with(DICTIONARY_SUFFIX)
}

/// Live entries of a hash-backed collection: raw slot count minus
/// free-list slots. `None` when either field cannot be read.
pub fn live_entry_count(obj: &dyn HeapObject) -> Option<i64> {
    let raw = obj.read_int_field(FIELD_COUNT)?;
    let free = obj.read_int_field(FIELD_FREE_COUNT)?;
    Some(raw - free)
}

/// Collects size and capacity statistics for every dictionary-style
/// collection on the heap.
///
/// For each recognized object it records the live-entry count in a
/// histogram and accumulates backing-array capacity. Capacity of
/// dictionaries with at least one live entry is tracked separately so
/// the reported load factor never counts space held by empty
/// dictionaries.
#[derive(Debug, Default)]
pub struct DictSizeCollector {
    dictionaries_seen: u64,
    capacity_total: u64,
    nonempty_seen: u64,
    nonempty_capacity_total: u64,
    size_histogram: Histogram<u64>,
}

impl DictSizeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum the other instance's counters and histogram into this one.
    pub fn merge(&mut self, other: DictSizeCollector) {
        self.dictionaries_seen += other.dictionaries_seen;
        self.capacity_total += other.capacity_total;
        self.nonempty_seen += other.nonempty_seen;
        self.nonempty_capacity_total += other.nonempty_capacity_total;
        self.size_histogram.merge(other.size_histogram);
    }

    pub fn dictionaries_seen(&self) -> u64 {
        self.dictionaries_seen
    }

    pub fn capacity_total(&self) -> u64 {
        self.capacity_total
    }

    pub fn size_histogram(&self) -> &Histogram<u64> {
        &self.size_histogram
    }

    /// Mean live entries per dictionary, 0 when none were seen.
    pub fn average_live_entries(&self) -> f64 {
        if self.dictionaries_seen == 0 {
            return 0.0;
        }
        let live_total: u64 = self
            .size_histogram
            .entries()
            .map(|(size, count)| size * count)
            .sum();
        live_total as f64 / self.dictionaries_seen as f64
    }

    /// Mean backing capacity over dictionaries with at least one live
    /// entry, 0 when every dictionary was empty.
    pub fn average_load_factor(&self) -> f64 {
        if self.nonempty_seen == 0 {
            return 0.0;
        }
        self.nonempty_capacity_total as f64 / self.nonempty_seen as f64
    }
}

impl StatCollector for DictSizeCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::DictSize
    }

    fn display_name(&self) -> &'static str {
        "Dictionary Size Stats"
    }

    fn process_object(&mut self, type_name: &str, obj: &dyn HeapObject) {
        if !is_dictionary_type(type_name) {
            return;
        }
        let Some(live) = live_entry_count(obj) else {
            return;
        };
        // Malformed snapshots can report more free slots than raw slots.
        let live = live.max(0) as u64;
        let capacity = obj
            .read_array_field(FIELD_ENTRIES)
            .map(|entries| entries.len() as u64)
            .unwrap_or(0);

        self.dictionaries_seen += 1;
        self.capacity_total += capacity;
        if live > 0 {
            self.nonempty_seen += 1;
            self.nonempty_capacity_total += capacity;
        }
        self.size_histogram.add(live);
    }

    fn write_report(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Number of dictionaries: {}", self.dictionaries_seen)?;
        writeln!(out, "Total backing capacity: {}", self.capacity_total)?;
        writeln!(
            out,
            "Average live entries per dictionary: {:.2}",
            self.average_live_entries()
        )?;
        writeln!(out, "Average load factor: {:.2}", self.average_load_factor())?;
        writeln!(out, "Histogram of dictionary sizes:")?;
        self.size_histogram
            .write_report(out, DEFAULT_TOP_COUNT, DEFAULT_KEY_WIDTH)
    }
}
