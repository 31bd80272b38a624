//! Frequency histogram used by every statistics collector.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::io::{self, Write};

use itertools::Itertools;

/// Number of top entries a report prints by default.
pub const DEFAULT_TOP_COUNT: usize = 20;

/// Default column width for stringified keys in a report.
pub const DEFAULT_KEY_WIDTH: usize = 80;

const COUNT_WIDTH: usize = 16;
const PERCENT_WIDTH: usize = 10;

/// A frequency-counting map from a comparable key to an occurrence count.
///
/// Merging two histograms is element-wise count addition, which makes the
/// merge commutative and associative — the order in which worker results
/// arrive never changes the aggregate.
///
/// # Examples
///
/// ```
/// use heapscan::histogram::Histogram;
///
/// let mut sizes = Histogram::new();
/// sizes.add(3u64);
/// sizes.add(3u64);
/// sizes.add(7u64);
///
/// assert_eq!(sizes.count(&3), 2);
/// assert_eq!(sizes.count(&99), 0);
/// assert_eq!(sizes.distinct(), 2);
/// assert_eq!(sizes.total(), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Histogram<K> {
    counts: HashMap<K, u64>,
}

impl<K: Eq + Hash> Histogram<K> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    /// Increment the count for `key` by 1, inserting it if absent.
    pub fn add(&mut self, key: K) {
        self.add_count(key, 1);
    }

    /// Increment the count for `key` by `amount` (used by merges).
    pub fn add_count(&mut self, key: K, amount: u64) {
        *self.counts.entry(key).or_insert(0) += amount;
    }

    /// Current count for `key`, 0 if it was never added.
    pub fn count(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys observed.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts across every entry.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Iterate over every key/count pair, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(key, count)| (key, *count))
    }

    /// Fold `other` into `self` by element-wise count addition.
    pub fn merge(&mut self, other: Histogram<K>) {
        for (key, count) in other.counts {
            self.add_count(key, count);
        }
    }
}

impl<K: Eq + Hash + Ord + Display> Histogram<K> {
    /// Write a ranked table of the `top_n` entries by descending count.
    ///
    /// Each row shows the stringified key (truncated to `key_width`
    /// characters with a trailing ellipsis), the count, and the entry's
    /// percentage of the total across *all* entries, not just the printed
    /// ones. Ties on count are broken by ascending key so the output is
    /// deterministic.
    pub fn write_report(
        &self,
        out: &mut dyn Write,
        top_n: usize,
        key_width: usize,
    ) -> io::Result<()> {
        let total = self.total();
        writeln!(
            out,
            "{:<key_width$} {:<COUNT_WIDTH$} Percentage",
            "Key", "Count"
        )?;
        writeln!(
            out,
            "{}",
            "-".repeat(key_width + COUNT_WIDTH + PERCENT_WIDTH)
        )?;

        let ranked = self
            .counts
            .iter()
            .sorted_by(|(key_a, count_a), (key_b, count_b)| {
                count_b.cmp(count_a).then_with(|| key_a.cmp(key_b))
            })
            .take(top_n);

        for (key, count) in ranked {
            let percentage = if total == 0 {
                "0.000%".to_string()
            } else {
                format!("{:.2}%", *count as f64 * 100.0 / total as f64)
            };
            writeln!(
                out,
                "{:<key_width$} {:<COUNT_WIDTH$} {}",
                truncate_key(&key.to_string(), key_width),
                count,
                percentage
            )?;
        }
        Ok(())
    }
}

/// Clip a stringified key to `max_chars` characters, marking the cut with
/// a three-character ellipsis.
fn truncate_key(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let mut clipped: String = input.chars().take(max_chars.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<K: Eq + Hash + Ord + Display>(histogram: &Histogram<K>) -> String {
        let mut buffer = Vec::new();
        histogram
            .write_report(&mut buffer, DEFAULT_TOP_COUNT, DEFAULT_KEY_WIDTH)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn add_and_lookup() {
        let mut histogram = Histogram::new();
        histogram.add("a");
        histogram.add("a");
        histogram.add("b");

        assert_eq!(histogram.count(&"a"), 2);
        assert_eq!(histogram.count(&"b"), 1);
        assert_eq!(histogram.count(&"missing"), 0);
        assert_eq!(histogram.distinct(), 2);
        assert_eq!(histogram.total(), 3);
    }

    #[test]
    fn add_count_inserts_absent_keys() {
        let mut histogram = Histogram::new();
        histogram.add_count(5u64, 7);
        assert_eq!(histogram.count(&5), 7);
    }

    #[test]
    fn merge_is_commutative_and_associative() {
        let mut a = Histogram::new();
        a.add("x");
        a.add("y");
        let mut b = Histogram::new();
        b.add("y");
        b.add("z");
        let mut c = Histogram::new();
        c.add_count("x", 3);

        // (a + b) + c
        let mut left = a.clone();
        left.merge(b.clone());
        left.merge(c.clone());

        // a + (c + b), different grouping and order
        let mut inner = c.clone();
        inner.merge(b.clone());
        let mut right = a.clone();
        right.merge(inner);

        for key in ["x", "y", "z"] {
            assert_eq!(left.count(&key), right.count(&key), "key {key}");
        }
        assert_eq!(left.distinct(), right.distinct());
        assert_eq!(left.total(), right.total());
    }

    #[test]
    fn report_ranks_by_descending_count() {
        let mut histogram = Histogram::new();
        histogram.add_count("rare", 1);
        histogram.add_count("common", 10);
        histogram.add_count("middle", 5);

        let report = render(&histogram);
        let common_at = report.find("common").unwrap();
        let middle_at = report.find("middle").unwrap();
        let rare_at = report.find("rare").unwrap();
        assert!(common_at < middle_at && middle_at < rare_at);
    }

    #[test]
    fn report_percentage_uses_full_total_not_top_n() {
        let mut histogram = Histogram::new();
        for index in 0..30u64 {
            histogram.add_count(index, 1);
        }
        histogram.add_count(99, 70);

        // total is 100, so the dominant key reads exactly 70.00% even
        // though most entries fall outside the printed top 20.
        let report = render(&histogram);
        assert!(report.contains("70.00%"));
    }

    #[test]
    fn report_with_zero_total_does_not_divide() {
        let histogram: Histogram<u64> = Histogram::new();
        let report = render(&histogram);
        // Header and separator only; no rows, no panic.
        assert_eq!(report.lines().count(), 2);
    }

    #[test]
    fn long_keys_are_truncated_with_ellipsis() {
        let mut histogram = Histogram::new();
        histogram.add("k".repeat(200));

        let mut buffer = Vec::new();
        histogram.write_report(&mut buffer, 5, 10).unwrap();
        let report = String::from_utf8(buffer).unwrap();
        assert!(report.contains(&format!("{}...", "k".repeat(7))));
        assert!(!report.contains(&"k".repeat(11)));
    }

    #[test]
    fn truncate_leaves_short_keys_alone() {
        assert_eq!(truncate_key("short", 10), "short");
        assert_eq!(truncate_key("exactly-10", 10), "exactly-10");
    }
}
