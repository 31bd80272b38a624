//! Tests for the collector implementations and the registry.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::collectors::char_set::canonical_string;
    use crate::collectors::dict_size::{is_dictionary_type, live_entry_count};
    use crate::collectors::*;
    use crate::heap::HeapObject;
    use crate::test_heap::TestObject;

    fn feed(collector: &mut dyn StatCollector, obj: &TestObject) {
        let type_name = obj.type_name().expect("typed test object");
        collector.process_object(&type_name, obj);
    }

    #[test]
    fn dictionary_type_pattern_matches_instantiations_only() {
        assert!(is_dictionary_type(
            "System.Collections.Generic.Dictionary<System.String, System.Int32>"
        ));
        assert!(!is_dictionary_type("System.Collections.Generic.HashSet<System.Char>"));
        assert!(!is_dictionary_type("System.String"));
    }

    #[test]
    fn live_entries_are_raw_minus_free() {
        let dict = TestObject::dictionary(5, 2, 8);
        assert_eq!(live_entry_count(&dict), Some(3));

        let unreadable = TestObject::of_type("Anything");
        assert_eq!(live_entry_count(&unreadable), None);
    }

    #[test]
    fn dict_collector_tracks_sizes_and_capacity() {
        let mut collector = DictSizeCollector::new();
        feed(&mut collector, &TestObject::dictionary(5, 2, 8));
        feed(&mut collector, &TestObject::dictionary(3, 3, 4));
        feed(&mut collector, &TestObject::string("not a dictionary"));

        assert_eq!(collector.dictionaries_seen(), 2);
        assert_eq!(collector.capacity_total(), 12);
        assert_eq!(collector.size_histogram().count(&3), 1);
        assert_eq!(collector.size_histogram().count(&0), 1);
        assert!((collector.average_live_entries() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn load_factor_ignores_empty_dictionaries_on_both_sides() {
        let mut collector = DictSizeCollector::new();
        // Non-empty dictionary with capacity 8, empty one with capacity 4.
        feed(&mut collector, &TestObject::dictionary(5, 2, 8));
        feed(&mut collector, &TestObject::dictionary(3, 3, 4));

        assert!((collector.average_load_factor() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_factor_is_zero_when_every_dictionary_is_empty() {
        let mut collector = DictSizeCollector::new();
        feed(&mut collector, &TestObject::dictionary(3, 3, 4));
        feed(&mut collector, &TestObject::dictionary(0, 0, 16));

        assert_eq!(collector.average_load_factor(), 0.0);
        assert_eq!(collector.average_live_entries(), 0.0);
    }

    #[test]
    fn dict_with_null_backing_counts_capacity_zero() {
        let mut collector = DictSizeCollector::new();
        feed(&mut collector, &TestObject::dictionary_without_backing(4, 1));

        assert_eq!(collector.dictionaries_seen(), 1);
        assert_eq!(collector.capacity_total(), 0);
        assert_eq!(collector.size_histogram().count(&3), 1);
    }

    #[test]
    fn malformed_free_count_clamps_to_zero_live_entries() {
        let mut collector = DictSizeCollector::new();
        feed(&mut collector, &TestObject::dictionary(2, 7, 8));

        assert_eq!(collector.size_histogram().count(&0), 1);
    }

    #[test]
    fn dict_merge_sums_counters_and_histograms() {
        let mut left = DictSizeCollector::new();
        feed(&mut left, &TestObject::dictionary(5, 2, 8));
        let mut right = DictSizeCollector::new();
        feed(&mut right, &TestObject::dictionary(5, 2, 16));
        feed(&mut right, &TestObject::dictionary(3, 3, 4));

        left.merge(right);
        assert_eq!(left.dictionaries_seen(), 3);
        assert_eq!(left.capacity_total(), 28);
        assert_eq!(left.size_histogram().count(&3), 2);
        assert!((left.average_load_factor() - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn canonicalization_is_order_independent() {
        let mut forward = BTreeSet::new();
        for ch in ['b', 'a', 'a', 'c'] {
            forward.insert(ch);
        }
        let mut backward = BTreeSet::new();
        for ch in ['c', 'a', 'b'] {
            backward.insert(ch);
        }

        assert_eq!(canonical_string(&forward), "abc");
        assert_eq!(canonical_string(&forward), canonical_string(&backward));
        assert_eq!(canonical_string(&BTreeSet::new()), "");
    }

    #[test]
    fn char_set_collector_dedups_identical_contents() {
        let mut collector = CharSetDedupCollector::new(0);
        let slots = vec![
            TestObject::slot(-1, 'b'),
            TestObject::slot(0, 'a'),
            TestObject::slot(2, 'a'),
        ];
        feed(&mut collector, &TestObject::char_set(3, 0, slots.clone()));
        feed(&mut collector, &TestObject::char_set(3, 0, slots));

        assert_eq!(collector.distinct_sets(), 1);
        assert_eq!(collector.set_histogram().count(&"ab".to_string()), 2);
        assert_eq!(collector.size_histogram().count(&2), 2);
    }

    #[test]
    fn char_set_collector_skips_free_slots() {
        let mut collector = CharSetDedupCollector::new(0);
        let slots = vec![
            TestObject::slot(-1, 'x'),
            // Next below -1 marks a free-list slot; its payload is stale.
            TestObject::slot(-3, 'z'),
        ];
        feed(&mut collector, &TestObject::char_set(2, 1, slots));

        assert_eq!(collector.set_histogram().count(&"x".to_string()), 1);
        assert_eq!(collector.set_histogram().count(&"xz".to_string()), 0);
    }

    #[test]
    fn char_set_collector_honors_the_size_threshold() {
        let mut collector = CharSetDedupCollector::new(3);
        let slots = vec![TestObject::slot(-1, 'a'), TestObject::slot(-1, 'b')];
        // Two live entries, threshold three: ignored entirely.
        feed(&mut collector, &TestObject::char_set(2, 0, slots));

        assert_eq!(collector.distinct_sets(), 0);
        assert_eq!(collector.size_histogram().total(), 0);
    }

    #[test]
    fn char_set_collector_skips_sets_with_no_raw_slots() {
        let mut collector = CharSetDedupCollector::new(0);
        feed(&mut collector, &TestObject::char_set(0, 0, Vec::new()));

        assert_eq!(collector.distinct_sets(), 0);
    }

    #[test]
    fn string_collector_counts_duplicate_contents() {
        let mut collector = StringDedupCollector::new(0);
        feed(&mut collector, &TestObject::string("repeated"));
        feed(&mut collector, &TestObject::string("repeated"));
        feed(&mut collector, &TestObject::string("lonely"));

        assert_eq!(collector.distinct_strings(), 2);
        assert_eq!(collector.string_histogram().count(&"repeated".to_string()), 2);
    }

    #[test]
    fn string_collector_ignores_short_strings() {
        let mut collector = StringDedupCollector::new(5);
        feed(&mut collector, &TestObject::string("abc"));
        feed(&mut collector, &TestObject::string("abcde"));

        assert_eq!(collector.distinct_strings(), 1);
        assert_eq!(collector.string_histogram().count(&"abc".to_string()), 0);
    }

    #[test]
    fn string_collector_ignores_unreadable_strings() {
        let mut collector = StringDedupCollector::new(0);
        // Right type name, but the content cannot be decoded.
        feed(&mut collector, &TestObject::of_type("System.String"));

        assert_eq!(collector.distinct_strings(), 0);
    }

    #[test]
    fn holder_collector_counts_byte_array_and_empty_dict_fields() {
        let mut collector = SpecialHolderCollector::new();
        let holder = TestObject::of_type("Foo")
            .with_object("buffer", Some(TestObject::byte_array()))
            .with_object("lookup", Some(TestObject::dictionary(3, 3, 4)));
        feed(&mut collector, &holder);

        assert_eq!(collector.byte_array_holders().count(&"Foo".to_string()), 1);
        assert_eq!(collector.empty_dict_holders().count(&"Foo".to_string()), 1);
    }

    #[test]
    fn holder_collector_skips_null_and_populated_targets() {
        let mut collector = SpecialHolderCollector::new();
        let holder = TestObject::of_type("Bar")
            .with_object("nothing", None)
            .with_object("busy", Some(TestObject::dictionary(5, 2, 8)))
            .with_object("untyped", Some(TestObject::untyped()));
        feed(&mut collector, &holder);

        assert_eq!(collector.byte_array_holders().distinct(), 0);
        assert_eq!(collector.empty_dict_holders().distinct(), 0);
    }

    #[test]
    fn holder_collector_counts_once_per_qualifying_field() {
        let mut collector = SpecialHolderCollector::new();
        let holder = TestObject::of_type("Foo")
            .with_object("first", Some(TestObject::byte_array()))
            .with_object("second", Some(TestObject::byte_array()));
        feed(&mut collector, &holder);

        assert_eq!(collector.byte_array_holders().count(&"Foo".to_string()), 2);
    }

    #[test]
    fn registry_builds_fresh_instances_per_worker() {
        let mut registry = CollectorRegistry::new();
        registry.enable(CollectorConfig::StringDedup { min_chars: 0 });

        let mut first = registry.build_set();
        let second = registry.build_set();

        let obj = TestObject::string("only in the first set");
        first[0].process_object(&obj.type_name().unwrap(), &obj);

        let Collector::StringDedup(first_strings) = &first[0] else {
            panic!("expected string collector");
        };
        let Collector::StringDedup(second_strings) = &second[0] else {
            panic!("expected string collector");
        };
        assert_eq!(first_strings.distinct_strings(), 1);
        assert_eq!(second_strings.distinct_strings(), 0);
    }

    #[test]
    fn collector_enum_reports_matching_kind_and_name() {
        let cases = [
            (CollectorConfig::DictSize, CollectorKind::DictSize, "Dictionary Size Stats"),
            (
                CollectorConfig::CharSetDedup { min_live: 0 },
                CollectorKind::CharSetDedup,
                "HashSet<Char> Stats",
            ),
            (
                CollectorConfig::StringDedup { min_chars: 0 },
                CollectorKind::StringDedup,
                "String Object Stats",
            ),
            (
                CollectorConfig::SpecialHolder,
                CollectorKind::SpecialHolder,
                "Special Object Holder Stats",
            ),
        ];

        for (config, kind, name) in cases {
            let collector = config.build();
            assert_eq!(collector.kind(), kind);
            assert_eq!(collector.display_name(), name);
        }
    }
}
