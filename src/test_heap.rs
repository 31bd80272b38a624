//! Deterministic in-memory heap provider.
//!
//! Tests and examples build snapshots out of [`TestObject`]s instead of
//! loading a real dump: every field read is backed by plain maps, so
//! scans over a [`TestHeap`] are fully reproducible.

use std::collections::BTreeMap;

use crate::heap::{HeapArray, HeapObject, HeapProvider, HeapSegment};

const DICTIONARY_TYPE: &str = "System.Collections.Generic.Dictionary<System.String, System.Int32>";
const CHAR_SET_TYPE: &str = "System.Collections.Generic.HashSet<System.Char>";
const STRING_TYPE: &str = "System.String";
const BYTE_ARRAY_TYPE: &str = "System.Byte[]";

/// One scripted object in a test snapshot.
///
/// # Examples
///
/// ```
/// use heapscan::heap::HeapObject;
/// use heapscan::test_heap::TestObject;
///
/// let dict = TestObject::dictionary(5, 2, 8);
/// assert_eq!(dict.read_int_field("_count"), Some(5));
/// assert_eq!(dict.read_array_field("_entries").unwrap().len(), 8);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TestObject {
    type_name: Option<String>,
    int_fields: BTreeMap<String, i64>,
    char_fields: BTreeMap<String, char>,
    // Declaration order matters for reference_fields, so keep a Vec.
    object_fields: Vec<(String, Option<TestObject>)>,
    array_fields: BTreeMap<String, Vec<TestObject>>,
    string_value: Option<String>,
}

impl TestObject {
    /// An object whose type the provider failed to resolve.
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn of_type(type_name: &str) -> Self {
        Self {
            type_name: Some(type_name.to_string()),
            ..Self::default()
        }
    }

    pub fn with_int(mut self, name: &str, value: i64) -> Self {
        self.int_fields.insert(name.to_string(), value);
        self
    }

    pub fn with_char(mut self, name: &str, value: char) -> Self {
        self.char_fields.insert(name.to_string(), value);
        self
    }

    /// Declare an object-reference field; `None` scripts a null
    /// reference.
    pub fn with_object(mut self, name: &str, target: Option<TestObject>) -> Self {
        self.object_fields.push((name.to_string(), target));
        self
    }

    pub fn with_array(mut self, name: &str, elements: Vec<TestObject>) -> Self {
        self.array_fields.insert(name.to_string(), elements);
        self
    }

    pub fn with_string_value(mut self, value: &str) -> Self {
        self.string_value = Some(value.to_string());
        self
    }

    /// A dictionary-style collection with the given raw slot count,
    /// free-slot count, and backing-array capacity.
    pub fn dictionary(raw_count: i64, free_count: i64, capacity: usize) -> Self {
        Self::of_type(DICTIONARY_TYPE)
            .with_int("_count", raw_count)
            .with_int("_freeCount", free_count)
            .with_array("_entries", vec![TestObject::default(); capacity])
    }

    /// A dictionary whose `_entries` reference is null.
    pub fn dictionary_without_backing(raw_count: i64, free_count: i64) -> Self {
        Self::of_type(DICTIONARY_TYPE)
            .with_int("_count", raw_count)
            .with_int("_freeCount", free_count)
    }

    /// A char set over the given slots (see [`TestObject::slot`]).
    pub fn char_set(raw_count: i64, free_count: i64, slots: Vec<TestObject>) -> Self {
        Self::of_type(CHAR_SET_TYPE)
            .with_int("_count", raw_count)
            .with_int("_freeCount", free_count)
            .with_array("_entries", slots)
    }

    /// One hash-set slot; `next >= -1` marks it occupied.
    pub fn slot(next: i64, value: char) -> Self {
        Self::default().with_int("Next", next).with_char("Value", value)
    }

    pub fn string(content: &str) -> Self {
        Self::of_type(STRING_TYPE).with_string_value(content)
    }

    pub fn byte_array() -> Self {
        Self::of_type(BYTE_ARRAY_TYPE)
    }
}

impl HeapObject for TestObject {
    fn type_name(&self) -> Option<String> {
        self.type_name.clone()
    }

    fn read_int_field(&self, name: &str) -> Option<i64> {
        self.int_fields.get(name).copied()
    }

    fn read_char_field(&self, name: &str) -> Option<char> {
        self.char_fields.get(name).copied()
    }

    fn read_object_field(&self, name: &str) -> Option<Box<dyn HeapObject + '_>> {
        self.object_fields
            .iter()
            .find(|(field, _)| field == name)
            .and_then(|(_, target)| target.as_ref())
            .map(|target| Box::new(target.clone()) as Box<dyn HeapObject>)
    }

    fn read_array_field(&self, name: &str) -> Option<Box<dyn HeapArray + '_>> {
        self.array_fields
            .get(name)
            .map(|elements| Box::new(TestArray(elements.clone())) as Box<dyn HeapArray>)
    }

    fn read_as_string(&self, max_chars: usize) -> Option<String> {
        self.string_value
            .as_ref()
            .map(|content| content.chars().take(max_chars).collect())
    }

    fn reference_fields(&self) -> Vec<String> {
        self.object_fields
            .iter()
            .map(|(field, _)| field.clone())
            .collect()
    }
}

struct TestArray(Vec<TestObject>);

impl HeapArray for TestArray {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn struct_at(&self, index: usize) -> Option<Box<dyn HeapObject + '_>> {
        self.0
            .get(index)
            .map(|element| Box::new(element.clone()) as Box<dyn HeapObject>)
    }
}

/// A scripted heap segment.
#[derive(Clone, Debug, Default)]
pub struct TestSegment {
    objects: Vec<TestObject>,
}

impl TestSegment {
    pub fn new(objects: Vec<TestObject>) -> Self {
        Self { objects }
    }
}

impl HeapSegment for TestSegment {
    fn objects(&self) -> Box<dyn Iterator<Item = Box<dyn HeapObject + '_>> + '_> {
        Box::new(
            self.objects
                .iter()
                .map(|obj| Box::new(obj.clone()) as Box<dyn HeapObject>),
        )
    }
}

/// A scripted snapshot: a fixed list of segments.
///
/// # Examples
///
/// ```
/// use heapscan::heap::HeapProvider;
/// use heapscan::test_heap::{TestHeap, TestObject};
///
/// let heap = TestHeap::new()
///     .with_segment(vec![TestObject::string("a")])
///     .with_segment(vec![TestObject::string("b")]);
/// assert_eq!(heap.segments().count(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TestHeap {
    segments: Vec<TestSegment>,
}

impl TestHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segment(mut self, objects: Vec<TestObject>) -> Self {
        self.segments.push(TestSegment::new(objects));
        self
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl HeapProvider for TestHeap {
    fn segments(&self) -> Box<dyn Iterator<Item = Box<dyn HeapSegment>> + '_> {
        Box::new(
            self.segments
                .iter()
                .map(|segment| Box::new(segment.clone()) as Box<dyn HeapSegment>),
        )
    }
}
